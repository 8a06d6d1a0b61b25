use adflux_core::{FieldType, Platform, TableField, TableSchema};

const DELIVERY_CSV: &str = "\
Date,Campaign,Campaign_ID,Impressions,Clicks,Cost
2024-01-01,Brand,1001,1200,34,12.50
2024-01-01,Generic,1002,800,9,4.10
2024-01-02,Brand,1001,1320,41,13.75
2024-01-02,Generic,1002,760,11,3.95
";

const YOUTUBE_NDJSON: &str = r#"{"id":"v1","snippet":{"title":"Launch","publishedAt":"2024-01-01T10:00:00Z"}}
{"id":"v2","snippet":{"title":"Recap","publishedAt":"2024-01-02T10:00:00Z"}}
"#;

pub fn content(platform: Platform) -> &'static str {
    match platform {
        Platform::YouTube => YOUTUBE_NDJSON,
        _ => DELIVERY_CSV,
    }
}

pub fn schema(platform: Platform) -> TableSchema {
    match platform {
        Platform::YouTube => TableSchema::new(vec![
            TableField::new("id", FieldType::String),
            TableField::record(
                "snippet",
                vec![
                    TableField::new("title", FieldType::String),
                    TableField::new("publishedAt", FieldType::Timestamp),
                ],
            ),
        ]),
        _ => TableSchema::new(vec![
            TableField::new("Date", FieldType::Date),
            TableField::new("Campaign", FieldType::String),
            TableField::new("Campaign_ID", FieldType::Integer),
            TableField::new("Impressions", FieldType::Integer),
            TableField::new("Clicks", FieldType::Integer),
            TableField::new("Cost", FieldType::Float),
        ]),
    }
}
