use super::entities::Program;
use serde::Serialize;
use ts_rs::TS;

#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "program.ts")]
pub struct ProgramListResponse {
    pub items: Vec<Program>,
}
