//! Canonical reference data

use crate::database::entities::{Area, BillLedger, BillType, FileEntry};
use crate::error::DbError;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;

/// Default bill categories
pub fn bill_types() -> Vec<BillType> {
    vec![
        BillType::new("👔服饰", ""),
        BillType::new("🍖餐饮", ""),
        BillType::new("🏡房租", "房租、房贷、物业费等"),
        BillType::new("🚍出行", ""),
        BillType::new("😷医疗", ""),
        BillType::new("😎娱乐", ""),
    ]
}

/// The single default ledger
pub fn bill_ledgers() -> Vec<BillLedger> {
    vec![BillLedger {
        name: "📚默认".to_string(),
        note: "我的默认账本".to_string(),
        is_default: true,
    }]
}

/// Provincial-level administrative divisions with their division codes
const PROVINCES: &[(&str, &str)] = &[
    ("110000", "北京市"),
    ("120000", "天津市"),
    ("130000", "河北省"),
    ("140000", "山西省"),
    ("150000", "内蒙古自治区"),
    ("210000", "辽宁省"),
    ("220000", "吉林省"),
    ("230000", "黑龙江省"),
    ("310000", "上海市"),
    ("320000", "江苏省"),
    ("330000", "浙江省"),
    ("340000", "安徽省"),
    ("350000", "福建省"),
    ("360000", "江西省"),
    ("370000", "山东省"),
    ("410000", "河南省"),
    ("420000", "湖北省"),
    ("430000", "湖南省"),
    ("440000", "广东省"),
    ("450000", "广西壮族自治区"),
    ("460000", "海南省"),
    ("500000", "重庆市"),
    ("510000", "四川省"),
    ("520000", "贵州省"),
    ("530000", "云南省"),
    ("540000", "西藏自治区"),
    ("610000", "陕西省"),
    ("620000", "甘肃省"),
    ("630000", "青海省"),
    ("640000", "宁夏回族自治区"),
    ("650000", "新疆维吾尔自治区"),
    ("710000", "台湾省"),
    ("810000", "香港特别行政区"),
    ("820000", "澳门特别行政区"),
];

/// Reference areas for the travel log
pub fn areas() -> Vec<Area> {
    PROVINCES
        .iter()
        .map(|(code, name)| Area::new(code, name))
        .collect()
}

/// Index every regular file below `dir`
///
/// A missing directory yields an empty index. Entries are sorted by path so
/// the insert order is stable.
pub fn file_index(dir: &Path) -> Result<Vec<FileEntry>, DbError> {
    let mut entries = vec![];
    if dir.is_dir() {
        collect_files(dir, dir, &mut entries)?;
    }
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<FileEntry>) -> Result<(), DbError> {
    let io_err = |path: &Path| {
        let path = path.to_string_lossy().to_string();
        move |source| DbError::Io { path, source }
    };

    for entry in fs::read_dir(dir).map_err(io_err(dir))? {
        let entry = entry.map_err(io_err(dir))?;
        let path = entry.path();
        let metadata = entry.metadata().map_err(io_err(&path))?;

        if metadata.is_dir() {
            collect_files(root, &path, out)?;
            continue;
        }
        if !metadata.is_file() {
            continue;
        }

        let relative = path
            .strip_prefix(root)
            .unwrap_or(path.as_path())
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let modified_at = metadata
            .modified()
            .ok()
            .map(|t| DateTime::<Utc>::from(t).to_rfc3339());

        out.push(FileEntry {
            name: entry.file_name().to_string_lossy().to_string(),
            path: relative,
            size: metadata.len(),
            modified_at,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_bill_types() {
        let types = bill_types();
        assert_eq!(types.len(), 6);
        let names: HashSet<_> = types.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names.len(), 6);
        assert_eq!(types[2].note, "房租、房贷、物业费等");
    }

    #[test]
    fn test_single_default_ledger() {
        let ledgers = bill_ledgers();
        assert_eq!(ledgers.len(), 1);
        assert!(ledgers[0].is_default);
    }

    #[test]
    fn test_area_codes_unique() {
        let areas = areas();
        assert_eq!(areas.len(), 34);
        let codes: HashSet<_> = areas.iter().map(|a| a.code.as_str()).collect();
        assert_eq!(codes.len(), areas.len());
        assert!(areas.iter().all(|a| a.code.len() == 6));
    }

    #[test]
    fn test_file_index_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let files = file_index(&dir.path().join("nope")).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_file_index_walks_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("2024/01")).unwrap();
        fs::write(dir.path().join("b.txt"), b"hello").unwrap();
        fs::write(dir.path().join("2024/01/a.png"), b"").unwrap();

        let files = file_index(dir.path()).unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["2024/01/a.png", "b.txt"]);
        assert_eq!(files[1].name, "b.txt");
        assert_eq!(files[1].size, 5);
        assert!(files[1].modified_at.is_some());
    }
}
