//! Structural and statistical analysis of DIMACS CNF formulas.
//!
//! One single pass over the input: [`io`] turns the character stream into
//! header/literal events, [`ipasir::Facade`] enforces the solver-protocol
//! call order and detects clause boundaries, [`analyzer::Analyzer`]
//! accumulates every metric incrementally, and [`report`] serializes the
//! finalized feature mapping as XML or JSON.
//!
//! ```
//! use cnf_metrics::{analyzer::Analyzer, io, ipasir::Facade, report};
//!
//! let input = "p cnf 2 2\n1 2 0\n-1 -2 0\n";
//! let mut facade = Facade::new(Analyzer::new(report::Meta::new(), true));
//! io::read_dimacs(&mut input.as_bytes(), &mut facade, false).unwrap();
//! facade.solve().unwrap();
//! facade.release().unwrap();
//!
//! let report = facade.into_sink().into_report().unwrap();
//! assert_eq!(report.metrics["xor2_count"], report::MetricValue::Int(1));
//! ```

pub mod analyzer;
pub mod error;
pub mod io;
pub mod ipasir;
pub mod report;
pub mod types;
