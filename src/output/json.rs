//! JSON lines output.

use crate::output::OutputFormatter;
use crate::reading::{Category, Reading};
use serde::Serialize;
use std::io;

/// One JSON object per reading: the flat reading record plus its `category`.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonFormatter;

#[derive(Serialize)]
struct Line<'a> {
    category: Category,
    #[serde(flatten)]
    reading: &'a Reading,
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, reading: &Reading, category: Category) -> io::Result<String> {
        Ok(serde_json::to_string(&Line { category, reading })?)
    }
}
