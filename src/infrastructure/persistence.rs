use crate::domain::Table;

pub struct FileRepository;

impl FileRepository {
    /// Writes the table, header row first, to a CSV file.
    pub fn export_table_csv(table: &Table, filename: &str) -> Result<String, String> {
        let mut writer = csv::Writer::from_path(filename).map_err(|e| e.to_string())?;
        writer.write_record(&table.columns).map_err(|e| e.to_string())?;
        for row in &table.rows {
            writer.write_record(row).map_err(|e| e.to_string())?;
        }
        match writer.flush() {
            Ok(_) => Ok(filename.to_string()),
            Err(e) => Err(e.to_string()),
        }
    }
}
