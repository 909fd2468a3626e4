use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::json;

use super::auth::{ServiceAccountKey, TokenProvider};
use super::{checked, column_letter, CellValue, SheetError, SheetStore};

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DRIVE_FILES_API: &str = "https://www.googleapis.com/drive/v3/files";
const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

#[derive(Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Первый лист таблицы Google, найденной по имени.
pub struct GoogleSheet {
    client: Client,
    tokens: TokenProvider,
    spreadsheet_id: String,
    sheet_title: String,
}

impl GoogleSheet {
    /// Находит таблицу по точному имени и берёт её первый лист.
    pub async fn connect(
        key: ServiceAccountKey,
        spreadsheet_name: &str,
        timeout: Duration,
    ) -> Result<Self, SheetError> {
        let client = Client::builder().timeout(timeout).build()?;
        let tokens = TokenProvider::new(key, timeout)?;

        let spreadsheet_id = find_spreadsheet(&client, &tokens, spreadsheet_name).await?;
        let sheet_title = first_sheet_title(&client, &tokens, &spreadsheet_id)
            .await?
            .ok_or_else(|| SheetError::NotFound(spreadsheet_name.to_string()))?;

        log::info!(
            "📄 Using spreadsheet {:?} ({}), sheet {:?}",
            spreadsheet_name,
            spreadsheet_id,
            sheet_title
        );

        Ok(Self {
            client,
            tokens,
            spreadsheet_id,
            sheet_title,
        })
    }

    /// `'Лист 1'!G12`
    fn a1_range(&self, cell: Option<(usize, usize)>) -> String {
        let sheet = format!("'{}'", self.sheet_title.replace('\'', "''"));
        match cell {
            Some((row, column)) => format!("{}!{}{}", sheet, column_letter(column), row),
            None => sheet,
        }
    }

    fn values_url(&self, range: &str, suffix: &str) -> Result<Url, SheetError> {
        let mut url = Url::parse(SHEETS_API).map_err(|e| SheetError::Rejected(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| SheetError::Rejected("sheets API base URL".into()))?
            .push(&self.spreadsheet_id)
            .push("values")
            .push(&format!("{}{}", range, suffix));
        Ok(url)
    }
}

async fn find_spreadsheet(
    client: &Client,
    tokens: &TokenProvider,
    name: &str,
) -> Result<String, SheetError> {
    let query = format!(
        "name = '{}' and mimeType = '{}' and trashed = false",
        name.replace('\\', "\\\\").replace('\'', "\\'"),
        SPREADSHEET_MIME
    );
    let response = client
        .get(DRIVE_FILES_API)
        .bearer_auth(tokens.token().await?)
        .query(&[("q", query.as_str()), ("fields", "files(id)"), ("pageSize", "1")])
        .send()
        .await?;

    let list: DriveFileList = checked(response, "spreadsheet lookup").await?.json().await?;
    list.files
        .into_iter()
        .next()
        .map(|file| file.id)
        .ok_or_else(|| SheetError::NotFound(name.to_string()))
}

async fn first_sheet_title(
    client: &Client,
    tokens: &TokenProvider,
    spreadsheet_id: &str,
) -> Result<Option<String>, SheetError> {
    let response = client
        .get(format!("{}/{}", SHEETS_API, spreadsheet_id))
        .bearer_auth(tokens.token().await?)
        .query(&[("fields", "sheets.properties.title")])
        .send()
        .await?;

    let meta: SpreadsheetMeta = checked(response, "spreadsheet metadata").await?.json().await?;
    Ok(meta.sheets.into_iter().next().map(|sheet| sheet.properties.title))
}

#[async_trait]
impl SheetStore for GoogleSheet {
    async fn append_row(&self, values: Vec<CellValue>) -> Result<(), SheetError> {
        let url = self.values_url(&self.a1_range(None), ":append")?;
        let response = self
            .client
            .post(url)
            .bearer_auth(self.tokens.token().await?)
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .json(&json!({ "values": [values] }))
            .send()
            .await?;

        checked(response, "append row").await?;
        Ok(())
    }

    async fn row_count(&self) -> Result<usize, SheetError> {
        let url = self.values_url(&self.a1_range(None), "")?;
        let response = self
            .client
            .get(url)
            .bearer_auth(self.tokens.token().await?)
            .query(&[("majorDimension", "ROWS")])
            .send()
            .await?;

        let range: ValueRange = checked(response, "row count").await?.json().await?;
        Ok(range.values.len())
    }

    async fn set_cell(&self, row: usize, column: usize, value: CellValue) -> Result<(), SheetError> {
        let url = self.values_url(&self.a1_range(Some((row, column))), "")?;
        let response = self
            .client
            .put(url)
            .bearer_auth(self.tokens.token().await?)
            .query(&[("valueInputOption", "USER_ENTERED")])
            .json(&json!({ "values": [[value]] }))
            .send()
            .await?;

        checked(response, "update cell").await?;
        Ok(())
    }
}
