use std::path::Path;

use anyhow::{Context, Result};

use mealtrack_core::models::ExportData;

use super::Tracker;

pub(crate) fn cmd_export(tracker: &Tracker, output: Option<&Path>) -> Result<()> {
    let data = tracker.export_all();
    let body = serde_json::to_string_pretty(&data)?;

    match output {
        Some(path) => {
            std::fs::write(path, format!("{body}\n"))
                .with_context(|| format!("Failed to write export: {}", path.display()))?;
            eprintln!(
                "Exported {} meals, {} saved foods and {} weight entries to {}",
                data.meals.len(),
                data.food_history.len(),
                data.weight_entries.len(),
                path.display()
            );
        }
        None => println!("{body}"),
    }

    Ok(())
}

/// Parse an export file without touching the store.
pub(crate) fn read_export(path: &Path) -> Result<ExportData> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Not a mealtrack export: {}", path.display()))
}

pub(crate) fn cmd_import(tracker: &mut Tracker, path: &Path, json: bool) -> Result<()> {
    let data = read_export(path)?;
    let summary = tracker.import_all(data)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Import complete.\n");
        println!("  Meals imported:       {}", summary.meals_imported);
        println!("  Saved foods added:    {}", summary.history_entries_added);
        println!("  Weights added:        {}", summary.weight_entries_inserted);
        println!("  Weights replaced:     {}", summary.weight_entries_replaced);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_export_browser_shape() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("export.json");
        std::fs::write(
            &path,
            r#"{
                "version": 1,
                "exportedAt": "2024-05-01T10:00:00+03:00",
                "meals": [{
                    "date": "2024-05-01",
                    "mealType": "Обед",
                    "foodName": "Борщ",
                    "calories": "250",
                    "protein": "9",
                    "fats": "",
                    "carbs": "30"
                }],
                "foodHistory": {"Борщ": {"calories": "250", "protein": "9", "fats": "", "carbs": "30"}},
                "weightEntries": [{"date": "2024-05-01", "weight": 80.5}]
            }"#,
        )
        .unwrap();

        let data = read_export(&path).unwrap();
        assert_eq!(data.meals.len(), 1);
        assert_eq!(data.meals[0].food_name, "Борщ");
        assert!(data.food_history.contains("Борщ"));
        assert_eq!(data.weight_entries[0].weight, 80.5);
    }

    #[test]
    fn test_read_export_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let err = read_export(&tmp.path().join("nope.json")).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to open file"));
    }

    #[test]
    fn test_read_export_rejects_garbage() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bad.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(read_export(&path).is_err());
    }
}
