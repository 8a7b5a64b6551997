use cnf_metrics::{
    analyzer::Analyzer,
    error::Error,
    io,
    ipasir::{Facade, UNSAT},
    report::{read_report, Format, Meta, MetricValue, Report, Writer},
};

fn analyze(input: &str, multiline: bool, validate: bool) -> Result<Report, Error> {
    let mut meta = Meta::new();
    meta.insert("@time".into(), "2016-01-02T03:04:05".into());
    meta.insert("@filename".into(), "input.cnf".into());

    let mut facade = Facade::new(Analyzer::new(meta, validate));
    if multiline {
        io::read_dimacs_multiline(&mut input.as_bytes(), &mut facade, !validate)?;
    } else {
        io::read_dimacs(&mut input.as_bytes(), &mut facade, !validate)?;
    }
    assert_eq!(facade.solve()?, UNSAT);
    facade.release()?;
    facade.into_sink().into_report()
}

fn serialize(reports: &[Report], format: Format) -> String {
    let mut buf = Vec::new();
    let mut writer = Writer::new(&mut buf, format);
    for report in reports {
        writer.write(report).unwrap();
    }
    writer.finish().unwrap();
    String::from_utf8(buf).unwrap()
}

fn int(report: &Report, key: &str) -> i64 {
    match report.metrics.get(key) {
        Some(&MetricValue::Int(v)) => v,
        other => panic!("{key}: expected integer, got {other:?}"),
    }
}

#[test]
fn end_to_end_json() {
    let input = "c a comment\np cnf 4 3\n1 -2 0\n3 -4 -2 0\nc another\n1 -4 0\n";
    let report = analyze(input, false, true).unwrap();

    assert_eq!(int(&report, "clauses_count"), 3);
    assert_eq!(int(&report, "variables_unique_count"), 4);
    assert_eq!(int(&report, "literals_count"), 7);
    assert_eq!(int(&report, "connected_components"), 1);

    let text = serialize(std::slice::from_ref(&report), Format::Json);
    let parsed = read_report(&text, None).unwrap();
    assert_eq!(parsed, vec![report]);
    assert_eq!(parsed[0].meta["@filename"], "input.cnf");
}

#[test]
fn end_to_end_xml() {
    let input = "p cnf 2 2\n1 2 0\n-1 -2 0\n";
    let report = analyze(input, false, true).unwrap();
    assert_eq!(int(&report, "xor2_count"), 1);

    let text = serialize(std::slice::from_ref(&report), Format::Xml);
    assert!(text.starts_with("<?xml"));
    let parsed = read_report(&text, None).unwrap();
    assert_eq!(parsed, vec![report]);
}

#[test]
fn cross_format_round_trip() {
    let input = "p cnf 3 3\n1 2 3 0\n-1 2 0\n-2 -3 0\n";
    let report = analyze(input, false, true).unwrap();

    let as_xml = serialize(std::slice::from_ref(&report), Format::Xml);
    let from_xml = read_report(&as_xml, Some(Format::Xml)).unwrap();

    let as_json = serialize(&from_xml, Format::Json);
    let from_json = read_report(&as_json, Some(Format::Json)).unwrap();

    assert_eq!(from_json, vec![report]);
}

#[test]
fn streaming_multiple_entries() {
    let first = analyze("p cnf 1 1\n1 0\n", false, true).unwrap();
    let second = analyze("p cnf 2 1\n1 -2 0\n", false, true).unwrap();

    for format in [Format::Json, Format::Xml] {
        let text = serialize(&[first.clone(), second.clone()], format);
        let parsed = read_report(&text, None).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0], first);
        assert_eq!(parsed[1], second);
    }
}

#[test]
fn multiline_clauses() {
    let input = "p cnf 3 2\n1 2\n3 0 -1\n-2 -3 0\n";
    let report = analyze(input, true, true).unwrap();
    assert_eq!(int(&report, "clauses_count"), 2);
    assert_eq!(int(&report, "clauses_length_largest"), 3);
}

#[test]
fn multiline_implicit_terminator() {
    let report = analyze("p cnf 2 2\n1 0\n-1 2\n", true, true).unwrap();
    assert_eq!(int(&report, "clauses_count"), 2);
}

#[test]
fn contradictory_units_end_to_end() {
    let report = analyze("p cnf 1 2\n1 0\n-1 0\n", false, true).unwrap();
    assert_eq!(int(&report, "literals_unit_unique_count"), 2);
    assert_eq!(int(&report, "literals_unit_unique_positive_count"), 1);
    assert_eq!(int(&report, "literals_unit_unique_negative_count"), 1);
    assert_eq!(int(&report, "literals_unit_unique_contradictory_variable"), 1);
}

#[test]
fn tautology_end_to_end() {
    let report = analyze("p cnf 1 1\n1 -1 0\n", false, true).unwrap();
    assert_eq!(int(&report, "tautological_literals"), 1);
    assert_eq!(int(&report, "tautological_clauses"), 1);
}

#[test]
fn premature_terminator_rejected() {
    let err = analyze("p cnf 1 1\n0 1 0\n", false, true).unwrap_err();
    assert!(matches!(err, Error::Syntax { line: 2, .. }));
}

#[test]
fn header_mismatch_reports_both_counts() {
    let err = analyze("p cnf 3 2\n1 2 3 0\n", false, true).unwrap_err();
    match err {
        Error::HeaderMismatch {
            what,
            declared,
            computed,
        } => {
            assert_eq!(what, "clauses");
            assert_eq!((declared, computed), (2, 1));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn header_mismatch_bypassed_without_validation() {
    let report = analyze("p cnf 3 2\n1 2 3 0\n", false, false).unwrap();
    assert_eq!(int(&report, "clauses_count"), 1);
}

#[test]
fn literal_exceeding_nbvars_rejected() {
    let err = analyze("p cnf 1 1\n1 2 0\n", false, true).unwrap_err();
    assert!(matches!(err, Error::LiteralOutOfBounds { literal: 2, .. }));
}

#[test]
fn duplicates_still_count_towards_header() {
    // 2 declared, 2 read, but only 1 distinct: clauses_count still matches
    let report = analyze("p cnf 2 2\n1 2 0\n2 1 0\n", false, true).unwrap();
    assert_eq!(int(&report, "clauses_count"), 2);
    assert_eq!(int(&report, "clauses_unique_count"), 1);
}

#[test]
fn uniform_v5_sample() {
    // a small uniform 3-SAT instance
    let input = "\
c generated
p cnf 5 6
1 -2 3 0
-1 4 5 0
2 -3 -4 0
-1 -5 2 0
3 4 -5 0
-2 -3 5 0
";
    let report = analyze(input, false, true).unwrap();
    assert_eq!(int(&report, "clauses_count"), 6);
    assert_eq!(int(&report, "literals_count"), 18);
    assert_eq!(
        report.metrics["clauses_length_uniform"],
        MetricValue::Bool(true)
    );
    assert_eq!(int(&report, "connected_components"), 1);
    let ratio = match report.metrics["literals_positive_ratio"] {
        MetricValue::Float(v) => v,
        _ => unreachable!(),
    };
    assert!((ratio - 9.0 / 18.0).abs() < 1e-12);
}
