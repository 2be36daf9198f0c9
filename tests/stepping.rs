#![expect(clippy::unwrap_used)] // test code OK

use smallstep::ast::{Term, nil, num, truth};
use smallstep::history::changed_path;
use smallstep::sexpr::parse_sexpr;
use smallstep::{DriverConfig, Error, History, Stepper, can_step, evaluate, redex_path, step};

fn parse(input: &str) -> Term {
    parse_sexpr(input).unwrap_or_else(|e| panic!("failed to parse {input}: {e}"))
}

/// Terminating programs covering every kind of rewrite
const PROGRAMS: &[(&str, &str)] = &[
    ("(add (mul 2 3) (sub 10 4))", "12"),
    ("(if (lt 1 2) (add 1 1) (undefined-name))", "2"),
    ("((lambda (x y) (cons x y)) (add 1 2) 'z)", "(cons 3 (quote z))"),
    ("(car (cdr (cons 1 (cons 2 '()))))", "2"),
    ("(or (and (not 1) 2) (typeof \"s\"))", "(quote string)"),
    ("(band (bor 12 3) (bxor 7 (shl 1 2)))", "3"),
    (
        "((lambda (fact) (fact fact 4)) \
          (lambda (self n) (if (lte n 1) 1 (mul n (self self (sub n 1))))))",
        "24",
    ),
    ("((lambda (x) ((lambda (x) (add x 1)) (mul x 10))) 4)", "41"),
];

#[test]
fn every_step_rewrites_exactly_the_announced_position() {
    for (program, expected) in PROGRAMS {
        let mut term = parse(program);
        let mut steps = 0;
        while can_step(&term) {
            let path = redex_path(&term).unwrap_or_else(|| panic!("{program}: no redex"));
            let next = step(&term).unwrap_or_else(|e| panic!("{program}: {e}"));
            assert_ne!(next, term, "{program}: step {steps} made no progress");

            let changed = changed_path(&term, &next).unwrap_or_default();
            assert!(
                changed.starts_with(&path),
                "{program}: step {steps} changed {changed:?} outside redex {path:?}"
            );

            term = next;
            steps += 1;
        }
        assert_eq!(term, parse(expected), "{program}");
    }
}

#[test]
fn can_step_is_stable() {
    for (program, _) in PROGRAMS {
        let term = parse(program);
        let first = can_step(&term);
        for _ in 0..3 {
            assert_eq!(can_step(&term), first, "{program}");
        }
    }
}

#[test]
fn normal_forms_are_fixed_points() {
    let normal_forms = [
        "5",
        "-0.25",
        "\"text\"",
        "add",
        "(quote ())",
        "(quote sym)",
        "(lambda (x) (undefined-name x))",
        "(cons 1 (cons '() \"x\"))",
    ];
    for input in normal_forms {
        let term = parse(input);
        assert!(!can_step(&term), "{input} should be in normal form");
        assert_eq!(step(&term).unwrap(), term, "{input}");
        assert_eq!(redex_path(&term), None, "{input}");
    }
}

#[test]
fn if_never_reduces_the_branch_not_taken() {
    let result = evaluate(
        parse("(if (quote true) 1 (div 1 0))"),
        DriverConfig::default(),
    );
    assert_eq!(result.unwrap(), num(1));

    let result = evaluate(parse("(if (quote ()) (car 5) 2)"), DriverConfig::default());
    assert_eq!(result.unwrap(), num(2));
}

#[test]
fn lambda_application_takes_one_step() {
    let term = parse("((lambda (x) x) 5)");
    assert_eq!(step(&term).unwrap(), num(5));
}

#[test]
fn builtin_arithmetic_takes_one_step() {
    let test_cases = vec![
        ("(add 2 3)", num(5)),
        ("(sub 2 3)", num(-1)),
        ("(eql (quote true) (quote true))", truth()),
        ("(eql 1 2)", nil()),
    ];
    for (i, (input, expected)) in test_cases.into_iter().enumerate() {
        assert_eq!(step(&parse(input)).unwrap(), expected, "case #{}", i + 1);
    }
}

#[test]
fn unbounded_counter_keeps_stepping() {
    let counter = parse("((lambda (f) (f f 0)) (lambda (self n) (self self (add n 1))))");

    let mut term = counter.clone();
    for _ in 0..5_000 {
        assert!(can_step(&term));
        term = step(&term).unwrap();
    }
    assert!(can_step(&term));

    let mut stepper = Stepper::new(counter, DriverConfig::with_max_steps(300));
    assert_eq!(stepper.run().unwrap_err(), Error::StepLimitExceeded(300));
    assert!(!stepper.is_normal_form());
}

#[test]
fn errors_from_bad_programs() {
    assert_eq!(
        step(&parse("undefined-name")).unwrap_err(),
        Error::UndefinedSymbol("undefined-name".into())
    );
    assert!(matches!(
        step(&parse("(car 5)")).unwrap_err(),
        Error::TypeError(_)
    ));
    assert_eq!(
        step(&parse("(add 1)")).unwrap_err(),
        Error::TypeError("add: expected number, got nothing".into())
    );
    assert!(matches!(
        step(&parse("(car)")).unwrap_err(),
        Error::TypeError(_)
    ));
    assert!(matches!(
        step(&parse("(1 2)")).unwrap_err(),
        Error::InvalidOperator(_)
    ));
    assert!(matches!(
        step(&parse("((lambda x x) 1)")).unwrap_err(),
        Error::InvalidLambdaShape(_)
    ));
}

#[test]
fn builtins_ignore_surplus_operands() {
    assert_eq!(step(&parse("(add 1 2 3)")).unwrap(), num(3));
    assert_eq!(step(&parse("(not '() 5)")).unwrap(), truth());
}

#[test]
fn printed_results_read_back() {
    for program in ["(div 1 0)", "(sub 0 (div 1 0))", "(cons (div 1 0) (mul 2 0.5))"] {
        let result = evaluate(parse(program), DriverConfig::default()).unwrap();
        let shown = result.to_string();
        assert_eq!(parse(&shown), result, "{program} printed as {shown}");
    }

    let result = evaluate(parse("(div 0 0)"), DriverConfig::default()).unwrap();
    assert!(matches!(parse(&result.to_string()), Term::Number(n) if n.is_nan()));
}

#[test]
fn history_replays_the_driver_trace() {
    let program = PROGRAMS[2].0;

    let driver_trace: Vec<Term> = Stepper::new(parse(program), DriverConfig::default())
        .collect::<Result<_, _>>()
        .unwrap();

    let mut history = History::new(parse(program));
    while history.forward().unwrap().is_some() {}
    assert_eq!(&history.snapshots()[1..], driver_trace.as_slice());

    history.rewind();
    let mut replayed = Vec::new();
    while let Some(term) = history.forward().unwrap() {
        replayed.push(term.clone());
    }
    assert_eq!(replayed, driver_trace);
}

#[cfg(feature = "json")]
#[test]
fn snapshots_survive_json() {
    use smallstep::json::{parse_json_term, term_to_json_string};

    let mut history = History::new(parse(PROGRAMS[4].0));
    while history.forward().unwrap().is_some() {}

    for snapshot in history.snapshots() {
        let encoded = term_to_json_string(snapshot).unwrap();
        assert_eq!(&parse_json_term(&encoded).unwrap(), snapshot, "{encoded}");
    }
}
