//! CSV input and output around the classifier.
//!
//! Every file has a header row. Labeled files carry the integer label in the
//! first column; unlabeled files carry a row identifier there instead, which is
//! skipped. All remaining columns are numeric features.

use std::{io, path::Path};

use csv::{Reader, ReaderBuilder, StringRecord, Trim, Writer};

use crate::{
    bayes::Label,
    error::{BayesError, Result},
};

/// Feature vectors together with their class labels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabeledData {
    pub features: Vec<Vec<f64>>,
    pub labels: Vec<Label>,
}

impl LabeledData {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

pub fn load_labeled<P: AsRef<Path>>(path: P) -> Result<LabeledData> {
    let mut reader = builder().from_path(path)?;
    parse_labeled(&mut reader)
}

pub fn read_labeled<R: io::Read>(input: R) -> Result<LabeledData> {
    let mut reader = builder().from_reader(input);
    parse_labeled(&mut reader)
}

pub fn load_unlabeled<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<f64>>> {
    let mut reader = builder().from_path(path)?;
    parse_unlabeled(&mut reader)
}

pub fn read_unlabeled<R: io::Read>(input: R) -> Result<Vec<Vec<f64>>> {
    let mut reader = builder().from_reader(input);
    parse_unlabeled(&mut reader)
}

/// Writes predictions as `ID,Label` rows, numbering examples from 1.
pub fn write_predictions<P: AsRef<Path>>(path: P, predictions: &[Label]) -> Result<()> {
    let writer = Writer::from_path(path)?;
    write_records(writer, predictions)
}

pub fn write_predictions_to<W: io::Write>(output: W, predictions: &[Label]) -> Result<()> {
    write_records(Writer::from_writer(output), predictions)
}

fn builder() -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder.has_headers(true).trim(Trim::All);
    builder
}

fn parse_labeled<R: io::Read>(reader: &mut Reader<R>) -> Result<LabeledData> {
    let mut data = LabeledData::default();
    for record in reader.records() {
        let record = record?;
        let line = line_of(&record);

        let label = record
            .get(0)
            .filter(|label| !label.is_empty())
            .ok_or_else(|| parse_error(line, "csv record missing label entry".to_string()))?;
        let label = label
            .parse::<Label>()
            .map_err(|err| parse_error(line, format!("invalid label {label:?}: {err}")))?;

        data.features.push(parse_features(&record, line)?);
        data.labels.push(label);
    }
    Ok(data)
}

fn parse_unlabeled<R: io::Read>(reader: &mut Reader<R>) -> Result<Vec<Vec<f64>>> {
    let mut features = Vec::new();
    for record in reader.records() {
        let record = record?;
        features.push(parse_features(&record, line_of(&record))?);
    }
    Ok(features)
}

fn parse_features(record: &StringRecord, line: u64) -> Result<Vec<f64>> {
    record
        .iter()
        .skip(1)
        .enumerate()
        .map(|(column, value)| {
            value.parse::<f64>().map_err(|err| {
                let column = column + 1;
                parse_error(line, format!("invalid feature {value:?} in column {column}: {err}"))
            })
        })
        .collect()
}

fn write_records<W: io::Write>(mut writer: Writer<W>, predictions: &[Label]) -> Result<()> {
    writer.write_record(["ID", "Label"])?;
    for (i, prediction) in predictions.iter().enumerate() {
        writer.write_record(&[(i + 1).to_string(), prediction.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map_or(0, |position| position.line())
}

fn parse_error(line: u64, message: String) -> BayesError {
    BayesError::Parse { line, message }
}
