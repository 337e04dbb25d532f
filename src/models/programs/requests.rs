use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "program.ts")]
pub struct CreateProgramRequest {
    pub name: String,
    pub code: Option<String>,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "program.ts")]
pub struct UpdateProgramRequest {
    pub name: Option<String>,
    pub code: Option<String>,
}
