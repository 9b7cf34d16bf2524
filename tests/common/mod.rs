//! Shared fixtures for integration tests

#![allow(dead_code)]

use bariatric_anomaly::schema::CANONICAL_COLUMNS;

pub const TRAINING_ROWS: usize = 50;

/// One synthetic patient; `weightpre` runs evenly from 80 to 100
pub fn training_row(i: usize) -> [f64; 10] {
    let f = i as f64;
    let length = 160.0 + ((i * 7) % 30) as f64;
    let weightpre = 80.0 + 20.0 * f / (TRAINING_ROWS - 1) as f64;
    let weightpost = weightpre - 10.0 - ((i * 3) % 7) as f64;
    let bmipre = 28.0 + ((i * 11) % 13) as f64 * 0.5;
    let bmipost = bmipre - 3.0 - (i % 4) as f64 * 0.5;
    let waistpre = 95.0 + ((i * 5) % 17) as f64;
    let waistpost = waistpre - 8.0 - (i % 5) as f64;
    let pulsepre = 70.0 + ((i * 13) % 19) as f64;
    let pulsepost = pulsepre - 4.0 + (i % 6) as f64;
    [
        f + 1.0,
        length,
        weightpre,
        weightpost,
        bmipre,
        bmipost,
        waistpre,
        waistpost,
        pulsepre,
        pulsepost,
    ]
}

pub fn header() -> String {
    CANONICAL_COLUMNS.join(",")
}

pub fn csv_line(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Training corpus as CSV text
pub fn training_csv() -> String {
    let mut out = header();
    out.push('\n');
    for i in 0..TRAINING_ROWS {
        out.push_str(&csv_line(&training_row(i)));
        out.push('\n');
    }
    out
}

/// CSV text with the canonical header and the given rows
pub fn scoring_csv(rows: &[[f64; 10]]) -> String {
    let mut out = header();
    out.push('\n');
    for row in rows {
        out.push_str(&csv_line(row));
        out.push('\n');
    }
    out
}

/// Header spellings as they appear in the clinic's workbooks
pub const WORKBOOK_HEADERS: [&str; 10] = [
    "PatientNumber",
    "Length",
    "WeightPre",
    "WeightPost",
    "BMIPre",
    "BMIPost",
    "WaistPre",
    "WaistPost",
    "PulsePre",
    "PulsePost",
];

/// xlsx workbook with `rows` on `sheet`; `None` cells are left blank.
/// With `leading_sheet`, an unrelated sheet comes first.
pub fn xlsx(sheet: &str, rows: &[[Option<f64>; 10]], leading_sheet: bool) -> Vec<u8> {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    if leading_sheet {
        let info = workbook.add_worksheet();
        info.set_name("Info").unwrap();
        info.write_string(0, 0, "exported").unwrap();
    }
    let data = workbook.add_worksheet();
    data.set_name(sheet).unwrap();
    for (col, name) in WORKBOOK_HEADERS.iter().enumerate() {
        data.write_string(0, col as u16, *name).unwrap();
    }
    for (r, row) in rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            if let Some(v) = value {
                data.write_number(r as u32 + 1, col as u16, *v).unwrap();
            }
        }
    }
    workbook.save_to_buffer().unwrap()
}

pub fn present(row: [f64; 10]) -> [Option<f64>; 10] {
    row.map(Some)
}

/// Training corpus as an xlsx workbook
pub fn training_xlsx(sheet: &str, leading_sheet: bool) -> Vec<u8> {
    let rows: Vec<[Option<f64>; 10]> = (0..TRAINING_ROWS).map(|i| present(training_row(i))).collect();
    xlsx(sheet, &rows, leading_sheet)
}
