//! Ready-made pipelines for the four reference datasets.
//!
//! Each recipe is plain configuration: the same stages could be loaded from
//! JSON with [`Pipeline::from_json`]. Stage order matters and follows the
//! order in which the cleaning has to happen (for example the loan recipe
//! fills `Credit_History` before coercing it to an integer).

use crate::pipeline::{ErrorPolicy, Pipeline, Stage};
use crate::primitives::{CategoryOrder, ConversionPolicy, Expr, FillStrategy, Primitive};
use crate::table::{ColumnSpec, SemanticType, Value};

fn cols(names: &[&str]) -> Vec<String> {
    names.iter().map(|&n| n.to_owned()).collect()
}

fn pipeline(name: &str, stages: Vec<Stage>, expected_schema: Vec<ColumnSpec>) -> Pipeline {
    let mut pipeline = Pipeline::new(name);
    pipeline.stages = stages;
    pipeline.expected_schema = expected_schema;
    pipeline
}

/// Loan applications: impute, fix types, engineer a log income, encode.
pub fn loan_applications() -> Pipeline {
    let stages = vec![
        Stage::new(
            "fill_loan_amount",
            Primitive::FillMissing {
                columns: cols(&["LoanAmount"]),
                strategy: FillStrategy::Median,
            },
        ),
        Stage::new(
            "fill_loan_term",
            Primitive::FillMissing {
                columns: cols(&["Loan_Amount_Term"]),
                strategy: FillStrategy::Mode,
            },
        ),
        Stage::new(
            "fill_categoricals",
            Primitive::FillMissing {
                columns: cols(&[
                    "Gender",
                    "Married",
                    "Dependents",
                    "Self_Employed",
                    "Credit_History",
                ]),
                strategy: FillStrategy::Mode,
            },
        ),
        Stage::new(
            "dependents_open_bucket",
            Primitive::ReplaceValue {
                columns: Some(cols(&["Dependents"])),
                from: Value::text("3+"),
                to: Value::text("3"),
            },
        ),
        Stage::new(
            "coerce_dependents",
            Primitive::CoerceNumeric {
                columns: cols(&["Dependents"]),
                on_failure: ConversionPolicy::Fail,
            },
        ),
        Stage::new(
            "credit_history_to_int",
            Primitive::CoerceInteger {
                columns: cols(&["Credit_History"]),
            },
        ),
        Stage::new(
            "total_income",
            Primitive::DeriveColumn {
                target: "TotalIncome".to_owned(),
                expr: Expr::col("ApplicantIncome").add(Expr::col("CoapplicantIncome")),
            },
        ),
        Stage::new(
            "total_income_log",
            Primitive::DeriveColumn {
                target: "TotalIncome_Log".to_owned(),
                expr: Expr::col("TotalIncome").ln1p(),
            },
        ),
        Stage::new(
            "drop_raw_income",
            Primitive::DropColumns {
                columns: cols(&[
                    "Loan_ID",
                    "ApplicantIncome",
                    "CoapplicantIncome",
                    "TotalIncome",
                ]),
                ignore_missing: false,
            },
        ),
        Stage::new(
            "encode_loan_status",
            Primitive::LabelEncode {
                column: "Loan_Status".to_owned(),
                order: CategoryOrder::Sorted,
            },
        ),
        Stage::new(
            "one_hot_categoricals",
            Primitive::OneHotEncode {
                columns: cols(&[
                    "Gender",
                    "Married",
                    "Education",
                    "Self_Employed",
                    "Property_Area",
                ]),
                drop_first: true,
            },
        ),
    ];

    pipeline(
        "loan_applications",
        stages,
        vec![
            ColumnSpec::new("Credit_History", SemanticType::Integer, false),
            ColumnSpec::new("TotalIncome_Log", SemanticType::Numeric, true),
            ColumnSpec::new("Loan_Status", SemanticType::Integer, true),
        ],
    )
}

/// Cafe sales: numeric coercion, recomputed totals, placeholder cleanup.
pub fn cafe_sales() -> Pipeline {
    let categoricals = cols(&["Item", "Payment Method", "Location"]);
    let stages = vec![
        Stage::new(
            "coerce_quantity_and_price",
            Primitive::CoerceNumeric {
                columns: cols(&["Quantity", "Price Per Unit"]),
                on_failure: ConversionPolicy::Null,
            },
        ),
        Stage::new(
            "recompute_total_spent",
            Primitive::DeriveColumn {
                target: "Total Spent".to_owned(),
                expr: Expr::col("Quantity").mul(Expr::col("Price Per Unit")),
            },
        ),
        Stage::new(
            "unknown_to_missing",
            Primitive::ReplaceValue {
                columns: Some(categoricals.clone()),
                from: Value::text("UNKNOWN"),
                to: Value::Absent,
            },
        ),
        Stage::new(
            "fill_categoricals",
            Primitive::FillMissing {
                columns: categoricals,
                strategy: FillStrategy::Mode,
            },
        ),
        Stage::new(
            "parse_transaction_date",
            Primitive::CoerceDatetime {
                columns: cols(&["Transaction Date"]),
                format: None,
                on_failure: ConversionPolicy::Null,
            },
        ),
    ];

    pipeline(
        "cafe_sales",
        stages,
        vec![
            ColumnSpec::new("Total Spent", SemanticType::Numeric, true),
            ColumnSpec::new("Transaction Date", SemanticType::Timestamp, true),
        ],
    )
}

/// Mission launches: drop index columns, clean prices, parse dates, derive country.
pub fn mission_launches() -> Pipeline {
    let stages = vec![
        Stage::new(
            "drop_index_columns",
            Primitive::DropColumns {
                columns: cols(&["Unnamed: 0.1", "Unnamed: 0"]),
                ignore_missing: true,
            },
        ),
        Stage::new(
            "strip_price_separators",
            Primitive::ReplaceText {
                columns: cols(&["Price"]),
                pattern: ",".to_owned(),
                replacement: String::new(),
            },
        ),
        Stage::new(
            "coerce_price",
            Primitive::CoerceNumeric {
                columns: cols(&["Price"]),
                on_failure: ConversionPolicy::Null,
            },
        ),
        Stage::new(
            "fill_price",
            Primitive::FillMissing {
                columns: cols(&["Price"]),
                strategy: FillStrategy::Median,
            },
        ),
        Stage::new(
            "parse_launch_date",
            Primitive::CoerceDatetime {
                columns: cols(&["Date"]),
                format: Some("%a %b %d, %Y %H:%M UTC".to_owned()),
                on_failure: ConversionPolicy::Null,
            },
        ),
        Stage::new(
            "country_from_location",
            Primitive::DeriveColumn {
                target: "Country".to_owned(),
                expr: Expr::col("Location").last_token(","),
            },
        )
        .with_policy(ErrorPolicy::Skip),
    ];

    pipeline(
        "mission_launches",
        stages,
        vec![ColumnSpec::new("Price", SemanticType::Numeric, false)],
    )
}

/// Media catalog: hidden missing markers, imputation, duration parsing.
pub fn media_catalog() -> Pipeline {
    let duration_where = |needle: &str| {
        Expr::if_else(
            Expr::col("duration_unit").contains(needle),
            Expr::col("duration_value"),
            Expr::lit(0_i64),
        )
    };

    let stages = vec![
        Stage::new(
            "not_given_to_missing",
            Primitive::ReplaceValue {
                columns: None,
                from: Value::text("Not Given"),
                to: Value::Absent,
            },
        ),
        Stage::new(
            "fill_director",
            Primitive::FillMissing {
                columns: cols(&["director"]),
                strategy: FillStrategy::constant("Unknown"),
            },
        ),
        Stage::new(
            "fill_country",
            Primitive::FillMissing {
                columns: cols(&["country"]),
                strategy: FillStrategy::Mode,
            },
        ),
        Stage::new(
            "parse_date_added",
            Primitive::CoerceDatetime {
                columns: cols(&["date_added"]),
                format: None,
                on_failure: ConversionPolicy::Null,
            },
        ),
        Stage::new(
            "split_duration",
            Primitive::SplitColumn {
                column: "duration".to_owned(),
                delimiter: " ".to_owned(),
                into: cols(&["duration_value", "duration_unit"]),
                drop_source: true,
            },
        ),
        Stage::new(
            "coerce_duration_value",
            Primitive::CoerceNumeric {
                columns: cols(&["duration_value"]),
                on_failure: ConversionPolicy::Fail,
            },
        ),
        Stage::new(
            "duration_min",
            Primitive::DeriveColumn {
                target: "duration_min".to_owned(),
                expr: duration_where("min"),
            },
        ),
        Stage::new(
            "duration_seasons",
            Primitive::DeriveColumn {
                target: "duration_seasons".to_owned(),
                expr: duration_where("Season"),
            },
        ),
        Stage::new(
            "drop_duration_parts",
            Primitive::DropColumns {
                columns: cols(&["duration_value", "duration_unit"]),
                ignore_missing: false,
            },
        ),
    ];

    pipeline(
        "media_catalog",
        stages,
        vec![
            ColumnSpec::new("director", SemanticType::Text, false),
            ColumnSpec::new("duration_min", SemanticType::Numeric, true),
            ColumnSpec::new("duration_seasons", SemanticType::Numeric, true),
        ],
    )
}

/// Every recipe, in a stable order.
pub fn all() -> Vec<Pipeline> {
    vec![
        loan_applications(),
        cafe_sales(),
        mission_launches(),
        media_catalog(),
    ]
}

/// Look a recipe up by its pipeline name.
pub fn by_name(name: &str) -> Option<Pipeline> {
    all().into_iter().find(|p| p.name == name)
}
