use clap::Parser;
use std::fs;

use voc2tfrecord::config::{validate_ratio, DEFAULT_SEED, DEFAULT_TRAIN_RATIO};
use voc2tfrecord::{
    parse_annotation, read_examples_list, split_examples, AnnotationError, Args, BndBox,
    ConversionSettings, ConvertError, FailurePolicies, LabelMap, LabelMapError, Policy,
};

const DOG_XML: &str = r#"<annotation>
    <folder>images</folder>
    <filename>img1.jpg</filename>
    <size>
        <width>100</width>
        <height>100</height>
        <depth>3</depth>
    </size>
    <segmented>0</segmented>
    <object>
        <name>dog</name>
        <pose>Unspecified</pose>
        <truncated>0</truncated>
        <difficult>0</difficult>
        <bndbox>
            <xmin>10</xmin>
            <ymin>10</ymin>
            <xmax>50</xmax>
            <ymax>50</ymax>
        </bndbox>
    </object>
    <object>
        <name>cat</name>
        <bndbox>
            <xmin>20.5</xmin>
            <ymin>30</ymin>
            <xmax>80</xmax>
            <ymax>90.25</ymax>
        </bndbox>
    </object>
</annotation>"#;

fn ids(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_parse_label_map() {
    let text = r#"
# classes used by the front camera
item {
  id: 1
  name: 'dog'
  display_name: 'Dog'
}
item {
  name: "cat"
  id: 2
}
"#;
    let label_map = LabelMap::parse(text).unwrap();

    assert_eq!(label_map.len(), 2);
    assert_eq!(label_map.get("dog"), Some(1));
    assert_eq!(label_map.get("cat"), Some(2));
    assert_eq!(label_map.get("Dog"), None);
    assert_eq!(label_map.class_names().collect::<Vec<_>>(), vec!["dog", "cat"]);
}

#[test]
fn test_label_map_rejects_bad_ids() {
    let duplicate = "item { id: 1 name: 'dog' }\nitem { id: 1 name: 'cat' }";
    assert!(matches!(
        LabelMap::parse(duplicate),
        Err(LabelMapError::DuplicateId { id: 1, .. })
    ));

    let zero = "item { id: 0 name: 'background' }";
    assert!(matches!(
        LabelMap::parse(zero),
        Err(LabelMapError::NonPositiveId { id: 0, .. })
    ));

    let negative = "item { id: -3 name: 'dog' }";
    assert!(matches!(
        LabelMap::parse(negative),
        Err(LabelMapError::NonPositiveId { id: -3, .. })
    ));

    let same_name = "item { id: 1 name: 'dog' }\nitem { id: 2 name: 'dog' }";
    assert!(matches!(
        LabelMap::parse(same_name),
        Err(LabelMapError::DuplicateName(name)) if name == "dog"
    ));
}

#[test]
fn test_label_map_rejects_malformed_text() {
    assert!(matches!(
        LabelMap::parse("item { id: 1 }"),
        Err(LabelMapError::MissingField { field: "name", .. })
    ));
    assert!(matches!(
        LabelMap::parse("item { id: 1 name: 'dog'"),
        Err(LabelMapError::Syntax { .. })
    ));
    assert!(matches!(
        LabelMap::parse("item { id: one name: 'dog' }"),
        Err(LabelMapError::Syntax { .. })
    ));
    assert!(matches!(
        LabelMap::parse("classes { id: 1 name: 'dog' }"),
        Err(LabelMapError::Syntax { line: 1, .. })
    ));
}

#[test]
fn test_load_label_map_errors_carry_path() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("label_map.pbtxt");

    match LabelMap::load(&path) {
        Err(ConvertError::Io { path: error_path, .. }) => assert_eq!(error_path, path),
        other => panic!("expected io error, got {:?}", other),
    }

    fs::write(&path, "item { id: 0 name: 'dog' }").unwrap();
    match LabelMap::load(&path) {
        Err(ConvertError::MalformedLabelMap { path: error_path, .. }) => {
            assert_eq!(error_path, path)
        }
        other => panic!("expected malformed label map, got {:?}", other),
    }
}

#[test]
fn test_parse_annotation() {
    let record = parse_annotation(DOG_XML).unwrap();

    assert_eq!(record.filename, "img1.jpg");
    assert_eq!(record.image_width, 100);
    assert_eq!(record.image_height, 100);
    assert_eq!(record.objects.len(), 2);
    assert_eq!(record.objects[0].class_name, "dog");
    assert_eq!(
        record.objects[0].bbox,
        BndBox {
            xmin: 10.0,
            ymin: 10.0,
            xmax: 50.0,
            ymax: 50.0
        }
    );
    assert_eq!(record.objects[1].class_name, "cat");
    assert_eq!(record.objects[1].bbox.xmin, 20.5);
    assert_eq!(record.objects[1].bbox.ymax, 90.25);
}

#[test]
fn test_parse_annotation_without_objects() {
    let xml = r#"<annotation>
        <filename>empty.jpg</filename>
        <size><width>640</width><height>480</height></size>
    </annotation>"#;
    let record = parse_annotation(xml).unwrap();

    assert_eq!(record.filename, "empty.jpg");
    assert_eq!(record.image_width, 640);
    assert_eq!(record.image_height, 480);
    assert!(record.objects.is_empty());
}

#[test]
fn test_parse_annotation_missing_fields() {
    let no_filename = r#"<annotation>
        <size><width>640</width><height>480</height></size>
    </annotation>"#;
    assert!(matches!(
        parse_annotation(no_filename),
        Err(AnnotationError::MissingField("filename"))
    ));

    let no_size = r#"<annotation><filename>a.jpg</filename></annotation>"#;
    assert!(matches!(
        parse_annotation(no_size),
        Err(AnnotationError::MissingField("size"))
    ));

    let no_height = r#"<annotation>
        <filename>a.jpg</filename>
        <size><width>640</width></size>
    </annotation>"#;
    assert!(matches!(
        parse_annotation(no_height),
        Err(AnnotationError::MissingField("size.height"))
    ));
}

#[test]
fn test_parse_annotation_invalid_values() {
    let non_numeric = r#"<annotation>
        <filename>a.jpg</filename>
        <size><width>wide</width><height>480</height></size>
    </annotation>"#;
    assert!(matches!(
        parse_annotation(non_numeric),
        Err(AnnotationError::Xml(_))
    ));

    let zero_width = r#"<annotation>
        <filename>a.jpg</filename>
        <size><width>0</width><height>480</height></size>
    </annotation>"#;
    assert!(matches!(
        parse_annotation(zero_width),
        Err(AnnotationError::InvalidSize {
            width: 0,
            height: 480
        })
    ));

    assert!(parse_annotation("<annotation><filename>a.jpg</filen").is_err());
}

#[test]
fn test_parse_annotation_interleaved_objects() {
    let xml = r#"<annotation>
        <filename>a.jpg</filename>
        <object>
            <name>dog</name>
            <bndbox><xmin>1</xmin><ymin>2</ymin><xmax>3</xmax><ymax>4</ymax></bndbox>
        </object>
        <size><width>10</width><height>10</height></size>
        <object>
            <name>cat</name>
            <bndbox><xmin>5</xmin><ymin>6</ymin><xmax>7</xmax><ymax>8</ymax></bndbox>
        </object>
        <segmented>0</segmented>
        <object>
            <name>dog</name>
            <bndbox><xmin>0</xmin><ymin>0</ymin><xmax>9</xmax><ymax>9</ymax></bndbox>
        </object>
    </annotation>"#;
    let record = parse_annotation(xml).unwrap();

    assert_eq!(record.image_width, 10);
    let names: Vec<&str> = record
        .objects
        .iter()
        .map(|obj| obj.class_name.as_str())
        .collect();
    assert_eq!(names, vec!["dog", "cat", "dog"]);
    assert_eq!(record.objects[1].bbox.xmin, 5.0);
    assert_eq!(record.objects[2].bbox.xmax, 9.0);
}

#[test]
fn test_parse_annotation_incomplete_object() {
    let no_bndbox = r#"<annotation>
        <filename>a.jpg</filename>
        <size><width>10</width><height>10</height></size>
        <object><name>dog</name></object>
    </annotation>"#;
    assert!(matches!(
        parse_annotation(no_bndbox),
        Err(AnnotationError::IncompleteObject {
            index: 0,
            field: "bndbox"
        })
    ));

    let no_name = r#"<annotation>
        <filename>a.jpg</filename>
        <size><width>10</width><height>10</height></size>
        <object>
            <name>dog</name>
            <bndbox><xmin>1</xmin><ymin>1</ymin><xmax>2</xmax><ymax>2</ymax></bndbox>
        </object>
        <object>
            <bndbox><xmin>1</xmin><ymin>1</ymin><xmax>2</xmax><ymax>2</ymax></bndbox>
        </object>
    </annotation>"#;
    assert!(matches!(
        parse_annotation(no_name),
        Err(AnnotationError::IncompleteObject {
            index: 1,
            field: "name"
        })
    ));

    let no_ymax = r#"<annotation>
        <filename>a.jpg</filename>
        <size><width>10</width><height>10</height></size>
        <object>
            <name>dog</name>
            <bndbox><xmin>1</xmin><ymin>1</ymin><xmax>2</xmax></bndbox>
        </object>
    </annotation>"#;
    assert!(matches!(
        parse_annotation(no_ymax),
        Err(AnnotationError::IncompleteObject {
            field: "bndbox.ymax",
            ..
        })
    ));
}

#[test]
fn test_normalize_bounding_box() {
    let bbox = BndBox {
        xmin: 10.0,
        ymin: 20.0,
        xmax: 50.0,
        ymax: 80.0,
    };
    let normalized = bbox.normalize(200, 100);

    assert!((normalized.xmin - 0.05).abs() < 1e-6);
    assert!((normalized.xmax - 0.25).abs() < 1e-6);
    assert!((normalized.ymin - 0.2).abs() < 1e-6);
    assert!((normalized.ymax - 0.8).abs() < 1e-6);
    for value in [
        normalized.xmin,
        normalized.ymin,
        normalized.xmax,
        normalized.ymax,
    ] {
        assert!((0.0..=1.0).contains(&value));
    }
    assert!(normalized.xmin < normalized.xmax);
    assert!(normalized.ymin < normalized.ymax);
}

#[test]
fn test_split_examples_is_deterministic() {
    let example_ids: Vec<String> = (0..50).map(|i| format!("img{:03}", i)).collect();

    let first = split_examples(&example_ids, DEFAULT_TRAIN_RATIO, DEFAULT_SEED);
    let second = split_examples(&example_ids, DEFAULT_TRAIN_RATIO, DEFAULT_SEED);
    assert_eq!(first, second);

    let other_seed = split_examples(&example_ids, DEFAULT_TRAIN_RATIO, 7);
    assert_eq!(other_seed.train.len(), first.train.len());
}

#[test]
fn test_split_examples_keeps_every_id() {
    let example_ids: Vec<String> = (0..37).map(|i| format!("img{}", i)).collect();
    let split = split_examples(&example_ids, DEFAULT_TRAIN_RATIO, DEFAULT_SEED);

    assert_eq!(split.train.len() + split.val.len(), example_ids.len());

    let mut all: Vec<String> = split.train.iter().chain(&split.val).cloned().collect();
    all.sort();
    let mut expected = example_ids.clone();
    expected.sort();
    assert_eq!(all, expected);
}

#[test]
fn test_split_examples_ratio() {
    for (len, expected_train) in [(100, 95), (10, 9), (20, 19), (1, 0), (0, 0)] {
        let example_ids: Vec<String> = (0..len).map(|i| format!("img{}", i)).collect();
        let split = split_examples(&example_ids, DEFAULT_TRAIN_RATIO, DEFAULT_SEED);
        assert_eq!(split.train.len(), expected_train, "corpus of {}", len);
        assert_eq!(split.val.len(), len - expected_train, "corpus of {}", len);
    }

    let example_ids = ids(&["a", "b", "c", "d"]);
    let split = split_examples(&example_ids, 1.0, DEFAULT_SEED);
    assert_eq!(split.train.len(), 4);
    assert!(split.val.is_empty());
}

#[test]
fn test_split_examples_keeps_duplicates() {
    let example_ids = ids(&["a", "a", "b", "b", "c"]);
    let split = split_examples(&example_ids, 0.6, DEFAULT_SEED);

    let mut all: Vec<String> = split.train.iter().chain(&split.val).cloned().collect();
    all.sort();
    assert_eq!(all, ids(&["a", "a", "b", "b", "c"]));
}

#[test]
fn test_read_examples_list() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("trainval.txt");
    fs::write(&path, "a 1\n\n  b\nc -1\n").unwrap();

    assert_eq!(read_examples_list(&path).unwrap(), ids(&["a", "b", "c"]));

    let missing = temp_dir.path().join("missing.txt");
    assert!(matches!(
        read_examples_list(&missing),
        Err(ConvertError::Io { .. })
    ));
}

#[test]
fn test_validate_ratio() {
    assert!(validate_ratio("0.95").is_ok());
    assert!(validate_ratio("1.0").is_ok());
    assert!(validate_ratio("0.0").is_err());
    assert!(validate_ratio("-0.1").is_err());
    assert!(validate_ratio("1.1").is_err());
    assert!(validate_ratio("abc").is_err());
}

#[test]
fn test_settings_file_overrides_defaults() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("settings.json");
    fs::write(
        &path,
        r#"{ "seed": 7, "policies": { "on_malformed_annotation": "skip" } }"#,
    )
    .unwrap();

    let settings = ConversionSettings::from_file(&path).unwrap();
    assert_eq!(settings.seed, 7);
    assert_eq!(settings.train_ratio, DEFAULT_TRAIN_RATIO);
    assert_eq!(settings.policies.on_malformed_annotation, Policy::Skip);
    assert_eq!(settings.policies.on_missing_image, Policy::Abort);
    assert_eq!(settings.policies.on_missing_annotation, Policy::Skip);
}

#[test]
fn test_settings_file_rejects_invalid_content() {
    let temp_dir = tempfile::tempdir().unwrap();

    let unknown = temp_dir.path().join("unknown.json");
    fs::write(&unknown, r#"{ "bucket_name": "robosub" }"#).unwrap();
    assert!(matches!(
        ConversionSettings::from_file(&unknown),
        Err(ConvertError::Config { .. })
    ));

    let bad_ratio = temp_dir.path().join("ratio.json");
    fs::write(&bad_ratio, r#"{ "train_ratio": 1.5 }"#).unwrap();
    assert!(matches!(
        ConversionSettings::from_file(&bad_ratio),
        Err(ConvertError::Config { .. })
    ));
}

#[test]
fn test_settings_file_nests_policies() {
    let temp_dir = tempfile::tempdir().unwrap();

    let flat = temp_dir.path().join("flat.json");
    fs::write(&flat, r#"{ "on_missing_image": "skip" }"#).unwrap();
    assert!(matches!(
        ConversionSettings::from_file(&flat),
        Err(ConvertError::Config { .. })
    ));

    let unknown_policy = temp_dir.path().join("unknown_policy.json");
    fs::write(&unknown_policy, r#"{ "policies": { "on_bad_weather": "skip" } }"#).unwrap();
    assert!(matches!(
        ConversionSettings::from_file(&unknown_policy),
        Err(ConvertError::Config { .. })
    ));
}

#[test]
fn test_settings_file_accepts_serialized_settings() {
    let settings = ConversionSettings {
        train_ratio: 0.8,
        seed: 3,
        progress_interval: 10,
        policies: FailurePolicies::skip_all(),
    };
    let json = serde_json::to_string_pretty(&settings).unwrap();
    assert!(json.contains(r#""on_unsupported_image": "skip""#));

    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("settings.json");
    fs::write(&path, json).unwrap();
    assert_eq!(ConversionSettings::from_file(&path).unwrap(), settings);
}

#[test]
fn test_command_line_overrides_settings_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("settings.json");
    fs::write(&path, r#"{ "seed": 7, "train_ratio": 0.5 }"#).unwrap();

    let args = Args::try_parse_from([
        "voc2tfrecord",
        "--label_map_file",
        "label_map.pbtxt",
        "--image_dir",
        "images",
        "--annotation_dir",
        "xmls",
        "--trainval_file",
        "trainval.txt",
        "--output_dir",
        "out",
        "--config",
        path.to_str().unwrap(),
        "--seed",
        "9",
        "--on_missing_image",
        "skip",
    ])
    .unwrap();
    let config = args.into_config().unwrap();

    assert_eq!(config.settings.seed, 9);
    assert_eq!(config.settings.train_ratio, 0.5);
    assert_eq!(config.settings.policies.on_missing_image, Policy::Skip);
    assert_eq!(config.settings.policies.on_unsupported_image, Policy::Abort);
    assert_eq!(config.annotation_dir.to_str(), Some("xmls"));
}

#[test]
fn test_command_line_requires_paths() {
    assert!(Args::try_parse_from(["voc2tfrecord", "--image_dir", "images"]).is_err());
    assert!(Args::try_parse_from([
        "voc2tfrecord",
        "--label_map_file",
        "a",
        "--image_dir",
        "b",
        "--annotation_dir",
        "c",
        "--trainval_file",
        "d",
        "--output_dir",
        "e",
        "--train_ratio",
        "2.0",
    ])
    .is_err());
}
