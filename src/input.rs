//! Operator input: the base label and the month range.

use anyhow::Result;
use std::io::{BufRead, Write};
use tracing::info;

use crate::error::AutomationError;
use crate::range::{MonthRange, YearMonth, parse_number};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    BaseLabel,
    StartYear,
    StartMonth,
    EndYear,
    EndMonth,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::BaseLabel,
        Field::StartYear,
        Field::StartMonth,
        Field::EndYear,
        Field::EndMonth,
    ];

    pub fn question(self) -> &'static str {
        match self {
            Field::BaseLabel => {
                "Base name for the photo albums (Year_Month is appended, e.g. ChildName_Photos)"
            }
            Field::StartYear => "Start year (e.g. 2024)",
            Field::StartMonth => "Start month (1-12)",
            Field::EndYear => "End year (e.g. 2025)",
            Field::EndMonth => "End month (1-12)",
        }
    }
}

/// Answers the operator questions. `Ok(None)` means the operator cancelled.
pub trait InputProvider {
    fn ask(&mut self, field: Field, default: &str) -> Result<Option<String>>;
}

/// Defaults offered for each question.
#[derive(Debug, Clone)]
pub struct InputDefaults {
    pub label: String,
    pub month: YearMonth,
}

impl InputDefaults {
    /// Label `GalleryPhotos` and the current local month.
    pub fn current(label: &str) -> Self {
        Self {
            label: label.to_string(),
            month: YearMonth::containing(chrono::Local::now().date_naive()),
        }
    }

    fn for_field(&self, field: Field) -> String {
        match field {
            Field::BaseLabel => self.label.clone(),
            Field::StartYear | Field::EndYear => self.month.year().to_string(),
            Field::StartMonth | Field::EndMonth => self.month.month().to_string(),
        }
    }
}

/// A validated request to sweep `range`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub base_label: String,
    pub range: MonthRange,
}

/// Ask every question, then validate. Fails before any automation happens.
pub fn collect_request(
    provider: &mut dyn InputProvider,
    defaults: &InputDefaults,
) -> Result<RunRequest, AutomationError> {
    let mut answers = Vec::with_capacity(Field::ALL.len());
    for field in Field::ALL {
        let answer = provider.ask(field, &defaults.for_field(field))?;
        match answer.map(|a| a.trim().to_string()) {
            Some(a) if !a.is_empty() => answers.push(a),
            _ => {
                info!(?field, "input cancelled, aborting");
                return Err(AutomationError::InputCancelled(field.question().to_string()));
            }
        }
    }

    let start = YearMonth::new(
        parse_number(&answers[1], "start year")?,
        parse_number(&answers[2], "start month")?,
    )?;
    let end = YearMonth::new(
        parse_number(&answers[3], "end year")?,
        parse_number(&answers[4], "end month")?,
    )?;
    let range = MonthRange::new(start, end)?;

    Ok(RunRequest {
        base_label: answers.swap_remove(0),
        range,
    })
}

/// Line-based prompts. A blank line accepts the default; end of input cancels.
pub struct StdinPrompt<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> StdinPrompt<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }
}

impl<R: BufRead, W: Write> InputProvider for StdinPrompt<R, W> {
    fn ask(&mut self, field: Field, default: &str) -> Result<Option<String>> {
        write!(self.writer, "{} [{}]: ", field.question(), default)?;
        self.writer.flush()?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let line = line.trim();
        Ok(Some(if line.is_empty() {
            default.to_string()
        } else {
            line.to_string()
        }))
    }
}

/// Answers from pre-supplied values first, asking `fallback` for the rest.
pub struct PresetInput<P> {
    presets: Vec<(Field, String)>,
    fallback: P,
}

impl<P: InputProvider> PresetInput<P> {
    pub fn new(fallback: P) -> Self {
        Self {
            presets: Vec::new(),
            fallback,
        }
    }

    pub fn with_label(mut self, label: Option<String>) -> Self {
        if let Some(label) = label {
            self.presets.push((Field::BaseLabel, label));
        }
        self
    }

    pub fn with_start(mut self, start: Option<YearMonth>) -> Self {
        if let Some(start) = start {
            self.presets.push((Field::StartYear, start.year().to_string()));
            self.presets.push((Field::StartMonth, start.month().to_string()));
        }
        self
    }

    pub fn with_end(mut self, end: Option<YearMonth>) -> Self {
        if let Some(end) = end {
            self.presets.push((Field::EndYear, end.year().to_string()));
            self.presets.push((Field::EndMonth, end.month().to_string()));
        }
        self
    }
}

impl<P: InputProvider> InputProvider for PresetInput<P> {
    fn ask(&mut self, field: Field, default: &str) -> Result<Option<String>> {
        match self.presets.iter().find(|(f, _)| *f == field) {
            Some((_, value)) => Ok(Some(value.clone())),
            None => self.fallback.ask(field, default),
        }
    }
}
