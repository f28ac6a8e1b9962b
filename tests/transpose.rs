use csv_evolve::{
    error::EvolveError,
    row::{Row, parse_rows},
    transpose::{row_count_of, transpose},
};
use proptest::prelude::*;

fn table_strategy() -> impl Strategy<Value = Vec<Row>> {
    (1usize..6, 1usize..8).prop_flat_map(|(width, rows)| {
        proptest::collection::vec(
            proptest::collection::vec("[A-Za-z0-9_ .-]{0,6}", width),
            rows,
        )
        .prop_map(|table| table.into_iter().map(Row::from).collect())
    })
}

#[test]
fn transpose_matches_stride_extraction() {
    let rows = parse_rows(["a,b,c,d", "1,2,3,4"], b',');
    let columns = transpose(&rows).expect("transpose");
    assert_eq!(
        columns.iter().map(|c| c.to_line(b',')).collect::<Vec<_>>(),
        vec!["a,1", "b,2", "c,3", "d,4"]
    );
}

#[test]
fn transpose_rejects_row_wider_than_header() {
    let rows = parse_rows(["a,b", "1,2,3"], b',');
    assert_eq!(
        transpose(&rows),
        Err(EvolveError::MalformedTable {
            row: 2,
            expected: 2,
            found: 3
        })
    );
}

proptest! {
    #[test]
    fn transpose_is_its_own_inverse(table in table_strategy()) {
        let columns = transpose(&table).expect("well-formed table");
        prop_assert_eq!(columns.len(), table[0].width());
        prop_assert_eq!(row_count_of(&columns), table.len());
        let back = transpose(&columns).expect("columns are uniform");
        prop_assert_eq!(back, table);
    }

    #[test]
    fn transpose_fails_only_on_ragged_rows(
        table in table_strategy(),
        victim in any::<prop::sample::Index>(),
        extra in 1usize..3,
    ) {
        prop_assume!(table.len() > 1);
        let idx = 1 + victim.index(table.len() - 1);
        let mut ragged = table.clone();
        let mut fields = ragged[idx].fields().to_vec();
        fields.extend(std::iter::repeat_n(String::from("z"), extra));
        ragged[idx] = Row::from(fields);

        prop_assert!(transpose(&table).is_ok());
        let err = transpose(&ragged).expect_err("ragged table");
        prop_assert_eq!(
            err,
            EvolveError::MalformedTable {
                row: idx + 1,
                expected: table[0].width(),
                found: table[0].width() + extra,
            }
        );
    }
}
