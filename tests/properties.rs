//! Property tests for the invariants every primitive must keep.

use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tabwash::error::ErrorKind;
use tabwash::pipeline::Stage;
use tabwash::primitives::{
    CategoryOrder, ConversionPolicy, Expr, FillStrategy, NormalisationMethod, Primitive,
};
use tabwash::table::{Table, Value};

fn any_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Absent),
        any::<bool>().prop_map(Value::Bool),
        (-1_000_i64..1_000).prop_map(Value::Int),
        (-1e6..1e6f64).prop_map(Value::Float),
        "[0-9]{1,6}".prop_map(Value::text),
        "[0-9]{1,3}\\.[0-9]{1,2}".prop_map(Value::text),
        "[a-z ]{0,4}".prop_map(Value::text),
    ]
}

fn category() -> impl Strategy<Value = Value> {
    prop_oneof![Just(Value::Absent), "[a-e]".prop_map(Value::text)]
}

fn single(values: Vec<Value>) -> Table {
    Table::new(vec![("x".to_owned(), values)]).unwrap()
}

fn x() -> Vec<String> {
    vec!["x".to_owned()]
}

proptest! {
    #[test]
    fn stage_never_mutates_its_input(values in prop::collection::vec(any_value(), 0..20)) {
        let input = single(values);
        let snapshot = input.clone();
        let stages = [
            Stage::new("fill", Primitive::FillMissing { columns: x(), strategy: FillStrategy::Mode }),
            Stage::new("numeric", Primitive::CoerceNumeric { columns: x(), on_failure: ConversionPolicy::DropRow }),
            Stage::new("integer", Primitive::CoerceInteger { columns: x() }),
            Stage::new("datetime", Primitive::CoerceDatetime { columns: x(), format: None, on_failure: ConversionPolicy::DropRow }),
            Stage::new("replace", Primitive::ReplaceValue { columns: None, from: Value::text("a"), to: Value::Absent }),
            Stage::new("replace_text", Primitive::ReplaceText { columns: x(), pattern: ".".to_owned(), replacement: String::new() }),
            Stage::new("trim", Primitive::TrimWhitespace { columns: x() }),
            Stage::new("rename", Primitive::RenameColumns { mapping: BTreeMap::from([("x".to_owned(), "y".to_owned())]) }),
            Stage::new("derive", Primitive::DeriveColumn { target: "x2".to_owned(), expr: Expr::col("x").mul(Expr::col("x")) }),
            Stage::new("drop", Primitive::DropColumns { columns: x(), ignore_missing: false }),
            Stage::new("split", Primitive::SplitColumn {
                column: "x".to_owned(),
                delimiter: ".".to_owned(),
                into: vec!["whole".to_owned(), "part".to_owned()],
                drop_source: true,
            }),
            Stage::new("one_hot", Primitive::OneHotEncode { columns: x(), drop_first: true }),
            Stage::new("labels", Primitive::LabelEncode { column: "x".to_owned(), order: CategoryOrder::Sorted }),
            Stage::new("clip", Primitive::ClipOutliers { columns: x(), lower_quantile: 0.05, upper_quantile: 0.95 }),
            Stage::new("scale", Primitive::Normalize { columns: x(), method: NormalisationMethod::ZScore }),
        ];
        for stage in &stages {
            let result = stage.apply(&input);
            prop_assert_eq!(&input, &snapshot, "stage '{}' changed its input ({:?})", stage.name, result.err());
        }
    }

    #[test]
    fn mode_fill_leaves_no_gaps(values in prop::collection::vec(any_value(), 0..20)) {
        let any_present = values.iter().any(Value::is_present);
        let stage = Stage::new("fill", Primitive::FillMissing { columns: x(), strategy: FillStrategy::Mode });

        match stage.apply(&single(values)) {
            Ok((out, _)) => {
                prop_assert!(any_present);
                prop_assert!(out.get_column("x").unwrap().iter().all(Value::is_present));
            }
            Err(err) => {
                prop_assert!(!any_present);
                prop_assert_eq!(err.kind(), ErrorKind::EmptyColumn);
            }
        }
    }

    #[test]
    fn numeric_coercion_is_idempotent(values in prop::collection::vec(any_value(), 1..20)) {
        let primitive = Primitive::CoerceNumeric { columns: x(), on_failure: ConversionPolicy::Null };
        let (once, _) = primitive.apply(&single(values)).unwrap();
        let (twice, report) = primitive.apply(&once).unwrap();

        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(report.cells_modified, 0);
        prop_assert_eq!(report.conversion_failures, 0);
    }

    #[test]
    fn one_hot_drop_first_yields_one_column_less(values in prop::collection::vec(category(), 1..20)) {
        let distinct: BTreeSet<String> = values
            .iter()
            .filter_map(|v| v.as_str().map(str::to_owned))
            .collect();
        let primitive = Primitive::OneHotEncode { columns: x(), drop_first: true };
        let (out, report) = primitive.apply(&single(values.clone())).unwrap();

        prop_assert_eq!(out.column_count(), distinct.len().saturating_sub(1));
        prop_assert_eq!(report.cardinality, Some(distinct.len()));
        for row in 0..values.len() {
            let hot = out
                .columns()
                .filter(|(_, column)| column[row] == Value::Bool(true))
                .count();
            prop_assert!(hot <= 1);
        }
    }

    #[test]
    fn label_codes_have_no_gaps(
        values in prop::collection::vec(category(), 1..20),
        sorted in any::<bool>(),
    ) {
        let distinct = values
            .iter()
            .filter(|v| v.is_present())
            .map(|v| v.as_str().unwrap_or_default())
            .collect::<BTreeSet<_>>()
            .len();
        let order = if sorted { CategoryOrder::Sorted } else { CategoryOrder::FirstSeen };
        let primitive = Primitive::LabelEncode { column: "x".to_owned(), order };
        let (out, _) = primitive.apply(&single(values.clone())).unwrap();

        let codes: BTreeSet<i64> = out
            .get_column("x")
            .unwrap()
            .iter()
            .filter_map(|v| match v {
                Value::Int(code) => Some(*code),
                _ => None,
            })
            .collect();
        let expected: BTreeSet<i64> = (0..distinct as i64).collect();
        prop_assert_eq!(codes, expected);
        for (before, after) in values.iter().zip(out.get_column("x").unwrap()) {
            prop_assert_eq!(before.is_absent(), after.is_absent());
        }
    }
}
