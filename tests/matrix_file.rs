use std::fs;

use pearson_kernel::{
    build_matrix, read_matrix, write_matrix, CodecError, InMemoryRatings, MatrixConfig,
    RatingSource,
};
use tempfile::TempDir;

fn ratings() -> InMemoryRatings {
    let mut records = Vec::new();
    for user in 1..=30u32 {
        for item in 0..20u32 {
            if (user * 3 + item) % 4 != 0 {
                let rating = ((user * 11 + item * 7) % 9) as f64 / 2.0 + 0.5;
                records.push((user, item, rating));
            }
        }
    }
    // shares no item with anyone
    records.push((99, 500, 3.0));
    InMemoryRatings::from_records(records)
}

fn config() -> MatrixConfig {
    MatrixConfig {
        k: 4,
        overlap_threshold: 10,
        num_threads: 3,
    }
}

#[test]
fn test_round_trip_preserves_every_cell() {
    let source = ratings();
    let config = config();
    let matrix = build_matrix(&source, config).unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("out").join("r1.matrix");
    write_matrix(&path, &matrix, &config.annotation(source.user_ids())).unwrap();

    let loaded = read_matrix(&path, source.user_ids(), config.k).unwrap();
    assert_eq!(loaded.len(), matrix.len());

    for &row in source.user_ids() {
        for &col in source.user_ids() {
            let before = matrix.get(row, col).unwrap();
            let after = loaded.get(row, col).unwrap();
            match (before, after) {
                (Some(a), Some(b)) => assert!((a - b).abs() < 5e-5, "({row}, {col}): {a} vs {b}"),
                (None, None) => {}
                other => panic!("({row}, {col}) changed: {other:?}"),
            }
        }
    }
    assert!(loaded.neighbors_of(99).unwrap().is_empty());
}

#[test]
fn test_file_layout() {
    let source = ratings();
    let config = config();
    let matrix = build_matrix(&source, config).unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("r1.matrix");
    write_matrix(&path, &matrix, &config.annotation(source.user_ids())).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    let n = source.user_ids().len();

    assert_eq!(lines.len(), n + 2);
    assert_eq!(lines[0], n.to_string());
    assert!(lines[1].starts_with("k=4,overlap_threshold=10,threads=3,ordering="));
    for (i, line) in lines[2..].iter().enumerate() {
        let cells: Vec<&str> = line.split(',').collect();
        assert_eq!(cells.len(), n);
        assert_eq!(cells[i], "NaN");
        assert!(cells.iter().filter(|c| **c != "NaN").count() <= config.k);
        for cell in cells.iter().filter(|c| **c != "NaN") {
            let decimals = cell.split('.').nth(1).unwrap();
            assert_eq!(decimals.len(), 4);
        }
    }
}

#[test]
fn test_read_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = read_matrix(dir.path().join("absent.matrix"), &[1, 2], 5).unwrap_err();
    assert!(matches!(err, CodecError::Io(_)));
}

#[test]
fn test_read_rejects_truncated_file() {
    let source = ratings();
    let matrix = build_matrix(&source, config()).unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("r1.matrix");
    write_matrix(&path, &matrix, "").unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let truncated: Vec<&str> = text.lines().take(10).collect();
    fs::write(&path, truncated.join("\n")).unwrap();

    let err = read_matrix(&path, source.user_ids(), 4).unwrap_err();
    assert!(matches!(err, CodecError::MissingRow { row: 8 }));
}

#[test]
fn test_read_rejects_row_above_capacity() {
    let source = ratings();
    let matrix = build_matrix(&source, config()).unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("r1.matrix");
    write_matrix(&path, &matrix, "").unwrap();

    let err = read_matrix(&path, source.user_ids(), 1).unwrap_err();
    assert!(matches!(err, CodecError::RowOverCapacity { capacity: 1, .. }));
}
