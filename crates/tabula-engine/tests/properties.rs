use std::collections::HashMap;
use std::rc::Rc;

use proptest::prelude::*;
use tabula_engine::engine::{CellRef, to_formula_text, try_parse_formula};
use tabula_engine::script::{Interp, Procedure, Registry, ReturnCode, ScriptedProc};

fn cell_name() -> impl Strategy<Value = String> {
    (0usize..40, 0usize..60).prop_map(|(col, row)| CellRef::new(col, row).to_string())
}

fn operand() -> impl Strategy<Value = String> {
    prop_oneof![
        (0u32..10_000).prop_map(|n| n.to_string()),
        (0u32..10_000).prop_map(|n| format!("{}", f64::from(n) / 100.0)),
        cell_name(),
    ]
}

fn formula() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        operand(),
        (
            prop_oneof![Just("SUM"), Just("AVG"), Just("COUNT")],
            cell_name(),
            cell_name()
        )
            .prop_map(|(f, a, b)| format!("{}({}:{})", f, a, b)),
    ];
    leaf.prop_recursive(4, 32, 2, |inner| {
        prop_oneof![
            (
                inner.clone(),
                prop_oneof![Just("+"), Just("-"), Just("*"), Just("/")],
                inner.clone()
            )
                .prop_map(|(l, op, r)| format!("{} {} {}", l, op, r)),
            inner.clone().prop_map(|e| format!("({})", e)),
            (prop_oneof![Just("MIN"), Just("MAX")], inner.clone(), inner)
                .prop_map(|(f, a, b)| format!("{}({}, {})", f, a, b)),
        ]
    })
}

proptest! {
    #[test]
    fn formula_text_round_trips(text in formula()) {
        let postfix = try_parse_formula(&text).unwrap();
        let rendered = to_formula_text(&postfix).unwrap();
        let reparsed = try_parse_formula(&rendered).unwrap();
        prop_assert_eq!(&reparsed, &postfix);
        prop_assert_eq!(to_formula_text(&reparsed).unwrap(), rendered);
    }

    #[test]
    fn frames_balance_across_nested_calls(
        calls in prop::collection::vec((0usize..5, 0u32..8), 1..12)
    ) {
        let mut interp = Interp::new(());
        interp
            .eval(
                "proc down {n} { if {$n > 0} { down [expr $n - 1] } }
                 proc fail {n} { if {$n > 0} { fail [expr $n - 1] } else { error boom } }
                 proc leak {} { break }
                 proc early {n} { return $n; error unreachable }
                 proc guarded {n} { catch { fail $n } }",
            )
            .unwrap();
        for (kind, n) in calls {
            let script = match kind {
                0 => format!("down {}", n),
                1 => format!("fail {}", n),
                2 => "leak".to_string(),
                3 => format!("early {}", n),
                _ => format!("guarded {}", n),
            };
            let code = interp.evaluate(&script);
            prop_assert_eq!(interp.frame_depth(), 1);
            let expected = match kind {
                1 | 2 => ReturnCode::Error,
                _ => ReturnCode::Ok,
            };
            prop_assert_eq!(code, expected);
        }
    }

    #[test]
    fn registry_lookup_after_interleaved_registrations(
        names in prop::collection::vec("[a-z:]{1,4}", 1..64)
    ) {
        let mut registry: Registry<()> = Registry::new();
        let mut latest: HashMap<String, usize> = HashMap::new();
        for (i, name) in names.iter().enumerate() {
            let body = i.to_string();
            registry.register(name, Procedure::Scripted(Rc::new(ScriptedProc::new(vec![], body))));
            latest.insert(name.clone(), i);
        }
        prop_assert_eq!(registry.len(), latest.len());
        for (name, i) in &latest {
            match registry.get(name) {
                Some(Procedure::Scripted(p)) => prop_assert_eq!(&p.body, &i.to_string()),
                _ => prop_assert!(false, "lost procedure {}", name),
            }
        }
    }
}
