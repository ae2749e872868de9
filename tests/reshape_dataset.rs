use serde_json::{Value, json};
use statbank::{Dataset, Error, RowIndex, reshape};

fn bef5() -> Value {
    json!({
        "dimension": {
            "KØN": {"label": "sex", "category": {
                "index": {"M": 0, "K": 1},
                "label": {"M": "Men", "K": "Women"}}},
            "FODLAND": {"label": "country of birth", "category": {
                "index": {"5101": 0, "5104": 1},
                "label": {"5101": "Greenland", "5104": "Finland"}}},
            "ContentsCode": {"label": "Indhold", "category": {
                "index": {"BEF5": 0},
                "label": {"BEF5": "Population 1. January"},
                "unit": {"BEF5": {"base": "number", "decimals": 0}}}},
            "Tid": {"label": "time", "category": {
                "index": {"2018": 0, "2019": 1},
                "label": {"2018": "2018", "2019": "2019"}}},
            "id": ["KØN", "FODLAND", "ContentsCode", "Tid"],
            "size": [2, 2, 1, 2],
            "role": {"geo": ["FODLAND"], "metric": ["ContentsCode"], "time": ["Tid"]}
        },
        "label": "Population 1. January by sex, country of birth, Indhold and time",
        "source": "Statistics Denmark",
        "updated": "2020-02-11T07:00:00Z",
        "value": [7016, 7095, 1266, 1263, 9454, 9471, 2766, 2787]
    })
}

fn folk1a_response() -> Value {
    json!({"dataset": {
        "dimension": {
            "ContentsCode": {"label": "Indhold", "category": {
                "index": {"FOLK1A": 0},
                "label": {"FOLK1A": "Population at the first day of the quarter"}}},
            "Tid": {"label": "time", "category": {
                "index": {"2020K1": 0}, "label": {"2020K1": "2020Q1"}}},
            "id": ["ContentsCode", "Tid"],
            "size": [1, 1],
            "role": {"metric": ["ContentsCode"], "time": ["Tid"]}
        },
        "label": "Population at the first day of the quarter by Indhold and time",
        "source": "Statistics Denmark",
        "updated": "2020-02-11T07:00:00Z",
        "value": [5822763]
    }})
}

#[test]
fn decodes_dimensions_in_declared_order() {
    let ds = Dataset::from_value(&bef5()).unwrap();
    assert_eq!(ds.dimension_order, vec!["KØN", "FODLAND", "ContentsCode", "Tid"]);
    assert_eq!(ds.sizes, vec![2, 2, 1, 2]);
    assert_eq!(ds.values.len(), 8);
    assert_eq!(ds.source.as_deref(), Some("Statistics Denmark"));
    let kon = ds.dimension("køn").unwrap();
    assert_eq!(kon.category_keys, vec!["M", "K"]);
    assert_eq!(kon.labels().collect::<Vec<_>>(), vec!["Men", "Women"]);
    assert_eq!(kon.label_for("K"), Some("Women"));
}

#[test]
fn multi_index_follows_caller_key_order() {
    let ds = Dataset::from_value(&bef5()).unwrap();
    let table = reshape(&ds, &["køn", "tid", "fodland"]).unwrap();
    assert_eq!(table.shape(), (8, 1));
    assert_eq!(
        table.value_column(),
        "Population 1. January by sex, country of birth, Indhold and time"
    );
    match table.index() {
        RowIndex::Multi(m) => {
            assert_eq!(m.nlevels(), 3);
            assert_eq!(m.names(), ["køn", "tid", "fodland"]);
            assert_eq!(m.len(), 8);
        }
        other => panic!("expected a multi-level index, got {:?}", other),
    }
    assert_eq!(table.row_labels(0).unwrap(), vec!["Men", "2018", "Greenland"]);
    assert_eq!(table.row_labels(1).unwrap(), vec!["Men", "2018", "Finland"]);
    assert_eq!(table.row_labels(7).unwrap(), vec!["Women", "2019", "Finland"]);
    assert_eq!(table.values()[0], Some(7016.0));
    assert_eq!(table.values()[7], Some(2787.0));
}

#[test]
fn all_dimensions_as_keys_yield_one_row_per_value() {
    let ds = Dataset::from_value(&bef5()).unwrap();
    let table = reshape(&ds, ds.dimension_order.as_slice()).unwrap();
    assert_eq!(table.len(), ds.values.len());
    assert_eq!(table.index().len(), ds.values.len());
}

#[test]
fn keys_match_case_insensitively_and_skip_unknown() {
    let ds = Dataset::from_value(&bef5()).unwrap();
    let table = reshape(&ds, &["TID", "alder", "Køn", "FodLand", "tid"]).unwrap();
    match table.index() {
        RowIndex::Multi(m) => assert_eq!(m.names(), ["tid", "køn", "fodland"]),
        other => panic!("expected a multi-level index, got {:?}", other),
    }
}

#[test]
fn no_matching_keys_keeps_default_numbering() {
    let ds = Dataset::from_value(&bef5()).unwrap();
    let none: [&str; 0] = [];
    let flat = reshape(&ds, &none).unwrap();
    assert_eq!(flat.index(), &RowIndex::Range(8));
    assert_eq!(flat.row_labels(3).unwrap(), vec!["3"]);

    let unknown = reshape(&ds, &["alder", "område"]).unwrap();
    assert_eq!(unknown.index(), &RowIndex::Range(8));
}

#[test]
fn full_response_without_selectors() {
    let ds = Dataset::from_value(&folk1a_response()).unwrap();
    let none: [&str; 0] = [];
    let table = reshape(&ds, &none).unwrap();
    assert_eq!(table.shape(), (1, 1));
    assert_eq!(table.values(), &[Some(5822763.0)]);
    assert_eq!(
        table.value_column(),
        "Population at the first day of the quarter by Indhold and time"
    );
}

#[test]
fn declared_sizes_must_cover_values() {
    let mut v = bef5();
    v["value"] = json!([7016, 7095, 1266]);
    let ds = Dataset::from_value(&v).unwrap();
    let err = reshape(&ds, &["køn"]).unwrap_err();
    assert!(matches!(err, Error::DataShape(_)));
}

#[test]
fn partial_key_product_mismatch_is_an_error() {
    let ds = Dataset::from_value(&bef5()).unwrap();
    // Only 2 labels for 8 values.
    let err = reshape(&ds, &["køn"]).unwrap_err();
    assert!(matches!(err, Error::DataShape(_)));
}

#[test]
fn suppressed_values_stay_missing() {
    let mut v = bef5();
    v["value"] = json!([7016, null, 1266, 1263, 9454, 9471, 2766, 2787]);
    let ds = Dataset::from_value(&v).unwrap();
    let table = reshape(&ds, &["køn", "fodland", "tid"]).unwrap();
    assert_eq!(table.values()[1], None);
    let rec = &table.records()[1];
    assert_eq!(rec["køn"], json!("Men"));
    assert_eq!(rec["tid"], json!("2019"));
    assert!(rec[table.value_column()].is_null());
}

#[test]
fn one_size_per_dimension_is_required() {
    let v = json!({
        "dimension": {
            "Tid": {"label": "time", "category": {
                "index": {"2020K1": 0}, "label": {"2020K1": "2020Q1"}}},
            "id": ["Tid"],
            "size": [1, 1]
        },
        "label": "x",
        "value": [1]
    });
    let ds = Dataset::from_value(&v).unwrap();
    let none: [&str; 0] = [];
    let err = reshape(&ds, &none).unwrap_err();
    assert!(matches!(err, Error::DataShape(_)));
    assert!(err.to_string().contains("2 sizes declared for 1 dimensions"));
}

#[test]
fn declared_dimension_without_description_fails_to_decode() {
    let mut v = bef5();
    v["dimension"]["id"] = json!(["KØN", "FODLAND", "ContentsCode", "Tid", "ALDER"]);
    let err = Dataset::from_value(&v).unwrap_err();
    match err {
        Error::DataShape(msg) => assert!(msg.contains("ALDER")),
        other => panic!("unexpected error {:?}", other),
    }
}
