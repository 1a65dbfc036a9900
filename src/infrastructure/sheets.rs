//! Google Sheets v4 client.
//!
//! Blocking reqwest client (no async runtime). Authentication is a bearer
//! access token supplied by configuration; acquiring it is left to the
//! caller's tooling.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::source::{check_fits, RangeSource, SourceError, SourceResult, ValueInputMode};
use crate::domain::{GridRange, RawCells};

pub const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com";

static SPREADSHEET_ID_IN_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/spreadsheets/d/([a-zA-Z0-9_-]+)").expect("valid regex"));
static BARE_SPREADSHEET_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("valid regex"));

/// Extracts the spreadsheet id from a sharing URL or accepts a bare id.
///
/// The id is preferred over the full URL since URLs may carry `?gid=`
/// fragments.
///
/// ```
/// use sheetpanel::infrastructure::spreadsheet_id;
///
/// let url = "https://docs.google.com/spreadsheets/d/1AbC-d_9/edit?gid=0#gid=0";
/// assert_eq!(spreadsheet_id(url).as_deref(), Some("1AbC-d_9"));
/// assert_eq!(spreadsheet_id("1AbC-d_9").as_deref(), Some("1AbC-d_9"));
/// assert_eq!(spreadsheet_id("https://example.com/x"), None);
/// ```
pub fn spreadsheet_id(sheet_url: &str) -> Option<String> {
    let sheet_url = sheet_url.trim();
    if let Some(caps) = SPREADSHEET_ID_IN_URL.captures(sheet_url) {
        return Some(caps[1].to_string());
    }
    BARE_SPREADSHEET_ID
        .is_match(sheet_url)
        .then(|| sheet_url.to_string())
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: RawCells,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ValueRangeBody<'a> {
    range: &'a str,
    major_dimension: &'static str,
    values: &'a RawCells,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Maps a non-success HTTP status to the panel's error taxonomy.
pub fn error_for_status(status: u16, body: &str) -> SourceError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| {
            if body.trim().is_empty() {
                format!("HTTP {}", status)
            } else {
                body.trim().to_string()
            }
        });

    match status {
        401 => SourceError::Authentication(message),
        403 => SourceError::AccessDenied(message),
        404 => SourceError::SpreadsheetNotFound(message),
        400 => SourceError::Rejected(message),
        _ => SourceError::Unavailable(format!("HTTP {}: {}", status, message)),
    }
}

/// Sheets API client (blocking).
#[derive(Clone)]
pub struct SheetsClient {
    http: reqwest::blocking::Client,
    api_base: String,
    token: String,
}

impl SheetsClient {
    pub fn new(api_base: impl Into<String>, token: impl Into<String>) -> SourceResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("sheetpanel/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SourceError::Unavailable(e.to_string()))?;

        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    /// Titles of every worksheet in the spreadsheet.
    pub fn sheet_titles(&self, spreadsheet_id: &str) -> SourceResult<Vec<String>> {
        let url = self.url(&["v4", "spreadsheets", spreadsheet_id])?;
        let response = self.send(self.http.get(url).query(&[("fields", "sheets.properties.title")]))?;
        let meta: SpreadsheetMeta = response.json().map_err(|e| SourceError::Parse(e.to_string()))?;
        Ok(meta.sheets.into_iter().map(|s| s.properties.title).collect())
    }

    /// Reads unformatted values so numbers and booleans arrive typed.
    pub fn get_values(&self, spreadsheet_id: &str, range: &str) -> SourceResult<RawCells> {
        let url = self.url(&["v4", "spreadsheets", spreadsheet_id, "values", range])?;
        let request = self.http.get(url).query(&[
            ("valueRenderOption", "UNFORMATTED_VALUE"),
            ("majorDimension", "ROWS"),
        ]);
        let body: ValueRange = self
            .send(request)?
            .json()
            .map_err(|e| SourceError::Parse(e.to_string()))?;
        Ok(body.values)
    }

    pub fn update_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: &RawCells,
        mode: ValueInputMode,
    ) -> SourceResult<()> {
        let url = self.url(&["v4", "spreadsheets", spreadsheet_id, "values", range])?;
        let body = ValueRangeBody { range, major_dimension: "ROWS", values };
        let request = self
            .http
            .put(url)
            .query(&[("valueInputOption", mode.as_api_str())])
            .json(&body);
        self.send(request)?;
        Ok(())
    }

    fn url(&self, segments: &[&str]) -> SourceResult<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.api_base)
            .map_err(|e| SourceError::Unavailable(format!("invalid API base '{}': {}", self.api_base, e)))?;
        url.path_segments_mut()
            .map_err(|_| SourceError::Unavailable(format!("invalid API base '{}'", self.api_base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn send(&self, request: reqwest::blocking::RequestBuilder) -> SourceResult<reqwest::blocking::Response> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .map_err(|e| SourceError::Unavailable(e.to_string()))?;

        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "sheets response");
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(error_for_status(status.as_u16(), &body));
        }
        Ok(response)
    }
}

/// An opened worksheet: the explicit connection handle the panel passes
/// around instead of keeping process-wide state.
pub struct SheetSession {
    client: SheetsClient,
    spreadsheet_id: String,
    sheet_name: String,
}

impl SheetSession {
    /// Resolves the spreadsheet and checks the worksheet exists.
    pub fn open(client: SheetsClient, sheet_url: &str, sheet_name: &str) -> SourceResult<Self> {
        let spreadsheet_id = spreadsheet_id(sheet_url)
            .ok_or_else(|| SourceError::SpreadsheetNotFound(format!("no spreadsheet id in '{}'", sheet_url)))?;

        let titles = client.sheet_titles(&spreadsheet_id).inspect_err(|e| {
            warn!(spreadsheet = %spreadsheet_id, error = %e, "failed to open spreadsheet");
        })?;
        if !titles.iter().any(|t| t == sheet_name) {
            warn!(spreadsheet = %spreadsheet_id, sheet = sheet_name, ?titles, "worksheet missing");
            return Err(SourceError::WorksheetNotFound(sheet_name.to_string()));
        }

        info!(spreadsheet = %spreadsheet_id, sheet = sheet_name, "opened worksheet");
        Ok(Self {
            client,
            spreadsheet_id,
            sheet_name: sheet_name.to_string(),
        })
    }
}

impl RangeSource for SheetSession {
    fn get_range(&self, range: &GridRange) -> SourceResult<RawCells> {
        let a1 = range.qualified(&self.sheet_name);
        let values = self.client.get_values(&self.spreadsheet_id, &a1)?;
        info!(range = %a1, rows = values.len(), "read range");
        Ok(values)
    }

    fn set_range(&mut self, range: &GridRange, values: &RawCells, mode: ValueInputMode) -> SourceResult<()> {
        check_fits(range, values)?;
        let a1 = range.qualified(&self.sheet_name);
        self.client.update_values(&self.spreadsheet_id, &a1, values, mode)?;
        info!(range = %a1, rows = values.len(), %mode, "wrote range");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("Google Sheets {} / {}", self.spreadsheet_id, self.sheet_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CellValue, RangeSynchronizer};
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn test_spreadsheet_id_from_url_with_query() {
        assert_eq!(
            spreadsheet_id("https://docs.google.com/spreadsheets/d/abc_DEF-123/edit?usp=sharing").as_deref(),
            Some("abc_DEF-123")
        );
        assert_eq!(spreadsheet_id("  abc123  ").as_deref(), Some("abc123"));
        assert_eq!(spreadsheet_id("not an id"), None);
    }

    #[test]
    fn test_error_for_status_taxonomy() {
        let google = r#"{"error":{"code":403,"message":"The caller does not have permission","status":"PERMISSION_DENIED"}}"#;
        match error_for_status(403, google) {
            SourceError::AccessDenied(msg) => assert_eq!(msg, "The caller does not have permission"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(error_for_status(401, ""), SourceError::Authentication(m) if m == "HTTP 401"));
        assert!(matches!(error_for_status(404, "gone"), SourceError::SpreadsheetNotFound(m) if m == "gone"));
        assert!(matches!(error_for_status(400, "bad range"), SourceError::Rejected(_)));
        assert!(matches!(error_for_status(503, ""), SourceError::Unavailable(_)));
    }

    #[test]
    fn test_values_url_encodes_qualified_range() {
        let client = SheetsClient::new("https://sheets.example.test/", "t").unwrap();
        let range: GridRange = "A1:E32".parse().unwrap();
        let url = client
            .url(&["v4", "spreadsheets", "id1", "values", &range.qualified("My Sheet")])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.example.test/v4/spreadsheets/id1/values/'My%20Sheet'!A1:E32"
        );
    }

    #[test]
    fn test_value_range_parsing() {
        let body: ValueRange = serde_json::from_str(
            r#"{"range":"'PAINEL'!L1:N14","majorDimension":"ROWS","values":[["Total",12.5],[],[true]]}"#,
        )
        .unwrap();
        assert_eq!(body.values.len(), 3);
        assert_eq!(body.values[0][1], CellValue::Number(12.5));
        assert_eq!(body.values[2][0], CellValue::Bool(true));

        let empty: ValueRange = serde_json::from_str(r#"{"range":"'PAINEL'!L1:N14"}"#).unwrap();
        assert!(empty.values.is_empty());
    }

    #[test]
    fn test_update_body_shape() {
        let values = vec![vec![CellValue::Text("a".into()), CellValue::Empty]];
        let body = ValueRangeBody { range: "'P'!A1:B1", major_dimension: "ROWS", values: &values };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"range":"'P'!A1:B1","majorDimension":"ROWS","values":[["a",""]]}"#
        );
    }

    #[test]
    fn test_spreadsheet_meta_titles() {
        let meta: SpreadsheetMeta =
            serde_json::from_str(r#"{"sheets":[{"properties":{"title":"PAINEL"}},{"properties":{"title":"Aux"}}]}"#)
                .unwrap();
        let titles: Vec<_> = meta.sheets.into_iter().map(|s| s.properties.title).collect();
        assert_eq!(titles, vec!["PAINEL", "Aux"]);
    }

    // ── Against a mock Sheets API ───────────────────────────────────

    const SHEET_URL: &str = "https://docs.google.com/spreadsheets/d/id1/edit";

    fn mock_metadata(server: &MockServer, titles: &[&str]) {
        let sheets: Vec<_> = titles.iter().map(|t| json!({ "properties": { "title": t } })).collect();
        server.mock(|when, then| {
            when.method(GET)
                .path("/v4/spreadsheets/id1")
                .query_param("fields", "sheets.properties.title")
                .header("authorization", "Bearer t");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({ "sheets": sheets }));
        });
    }

    fn open_session(server: &MockServer) -> SheetSession {
        mock_metadata(server, &["Aux", "PAINEL"]);
        let client = SheetsClient::new(server.base_url(), "t").unwrap();
        SheetSession::open(client, SHEET_URL, "PAINEL").unwrap()
    }

    #[test]
    fn test_get_range_reads_unformatted_values() {
        let server = MockServer::start();
        let session = open_session(&server);

        let values_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/v4/spreadsheets/id1/values/'PAINEL'!A1:C3")
                .query_param("valueRenderOption", "UNFORMATTED_VALUE")
                .query_param("majorDimension", "ROWS")
                .header("authorization", "Bearer t");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "range": "PAINEL!A1:C3",
                    "majorDimension": "ROWS",
                    "values": [["Name", "Qty", "Ok"], ["A", 3, true]]
                }));
        });

        let range: GridRange = "A1:C3".parse().unwrap();
        let raw = session.get_range(&range).unwrap();
        values_mock.assert();

        let table = RangeSynchronizer::read_range(raw, &range, true);
        assert_eq!(table.columns, vec!["Name", "Qty", "Ok"]);
        assert_eq!(table.rows, vec![vec!["A", "3", "TRUE"], vec!["", "", ""]]);
    }

    #[test]
    fn test_set_range_puts_user_entered_values() {
        let server = MockServer::start();
        let mut session = open_session(&server);

        let update_mock = server.mock(|when, then| {
            when.method(PUT)
                .path("/v4/spreadsheets/id1/values/'PAINEL'!A1:B2")
                .query_param("valueInputOption", "USER_ENTERED")
                .header("authorization", "Bearer t")
                .json_body(json!({
                    "range": "'PAINEL'!A1:B2",
                    "majorDimension": "ROWS",
                    "values": [["Name", "Qty"], ["=1+1", ""]]
                }));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({ "updatedCells": 4 }));
        });

        let range: GridRange = "A1:B2".parse().unwrap();
        let values = vec![
            vec![CellValue::Text("Name".into()), CellValue::Text("Qty".into())],
            vec![CellValue::Text("=1+1".into()), CellValue::Empty],
        ];
        session.set_range(&range, &values, ValueInputMode::UserEntered).unwrap();
        update_mock.assert();
    }

    #[test]
    fn test_http_errors_map_to_source_errors() {
        let server = MockServer::start();
        let session = open_session(&server);

        server.mock(|when, then| {
            when.method(GET).path("/v4/spreadsheets/id1/values/'PAINEL'!A1:A1");
            then.status(403)
                .header("content-type", "application/json")
                .json_body(json!({
                    "error": { "code": 403, "message": "The caller does not have permission", "status": "PERMISSION_DENIED" }
                }));
        });
        let range: GridRange = "A1".parse().unwrap();
        match session.get_range(&range) {
            Err(SourceError::AccessDenied(msg)) => assert_eq!(msg, "The caller does not have permission"),
            other => panic!("unexpected {other:?}"),
        }

        server.mock(|when, then| {
            when.method(GET).path("/v4/spreadsheets/missing");
            then.status(404)
                .header("content-type", "application/json")
                .json_body(json!({ "error": { "code": 404, "message": "Requested entity was not found." } }));
        });
        let client = SheetsClient::new(server.base_url(), "t").unwrap();
        let result = SheetSession::open(client, "https://docs.google.com/spreadsheets/d/missing/edit", "PAINEL");
        assert!(matches!(result, Err(SourceError::SpreadsheetNotFound(m)) if m == "Requested entity was not found."));
    }

    #[test]
    fn test_open_missing_worksheet() {
        let server = MockServer::start();
        mock_metadata(&server, &["Aux"]);
        let client = SheetsClient::new(server.base_url(), "t").unwrap();

        let result = SheetSession::open(client, SHEET_URL, "PAINEL");
        assert!(matches!(result, Err(SourceError::WorksheetNotFound(name)) if name == "PAINEL"));
    }
}
