use std::io::Write;

use tempfile::NamedTempFile;

/// Write CSV content to a temp file with a .csv suffix and return the handle
/// (the file is deleted when the handle drops).
pub fn csv_file(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile()
        .unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// A small mixed-type dataset: numeric, categorical, mostly-date, and a
/// column with missing values.
pub fn sample_csv() -> NamedTempFile {
    csv_file(
        "amount,label,when,partial\n\
         10.5,a,2021-01-01,1\n\
         20.0,b,2021-01-02,\n\
         30.5,a,2021-01-03,3\n\
         40.0,c,not-a-date,\n",
    )
}
