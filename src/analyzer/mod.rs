//! Feature collector.
//!
//! Consumes the façade's callbacks for one file, incrementally maintaining
//! every running statistic and both union-find partitions, then folds the
//! accumulated state into an immutable [`Report`] on finalization. State is
//! owned exclusively by one [`Analyzer`] per file; nothing is shared.

mod stats;
mod union_find;

use ahash::{AHashMap, AHashSet};
use log::warn;

use crate::{
    error::{Error, Result},
    ipasir::Sink,
    report::{Meta, Metrics, Report},
    types::{canonicalize, to_var, Clause, Header, Lit, Var},
};

use self::{stats::RunningStats, union_find::UnionFind};

const NEGATIVE_SEEN: u8 = 1;
const POSITIVE_SEEN: u8 = 2;

/// Node id of a signed literal in the literal partition: negative occurrences
/// map to `2*var - 1`, positive ones to `2*var`, leaving index 0 as the
/// nominal zero bucket.
fn lit_node(lit: Lit) -> usize {
    let var = to_var(lit);
    if lit < 0 {
        2 * var - 1
    } else {
        2 * var
    }
}

pub struct Analyzer {
    validate: bool,
    header: Option<Header>,

    clauses: AHashSet<Clause>,
    duplicate_count: usize,

    literals: AHashSet<Lit>,
    variable_recurrence: AHashMap<Var, i64>,
    polarity_seen: AHashMap<Var, u8>,

    // distributions over unique clauses
    clause_lengths: RunningStats,
    positive_per_clause: RunningStats,

    // per-clause polarity ratio accumulators, over all clause events
    ratio_sum: f64,
    ratio_entropy: f64,
    clause_events: u64,

    unit_positive: AHashSet<Var>,
    unit_negative: AHashSet<Var>,
    contradictory_variable: Option<Var>,

    positive_unit_clauses: u64,
    negative_unit_clauses: u64,
    two_literal_clauses: u64,
    definite_clauses: u64,
    goal_clauses: u64,
    true_trivial: bool,
    false_trivial: bool,

    tautological_literals: u64,
    tautological_clauses: u64,

    reference_length: Option<usize>,
    uniform_length: bool,

    xor2: AHashSet<(Lit, Lit)>,
    xor2_count: u64,

    literal_components: Option<UnionFind>,
    variable_components: Option<UnionFind>,

    meta: Meta,
    report: Option<Report>,
}

impl Analyzer {
    /// `validate` enables the header-consistency and literal-bound checks;
    /// disabling it also permits input without any header at all.
    pub fn new(meta: Meta, validate: bool) -> Self {
        Self {
            validate,
            header: None,
            clauses: AHashSet::new(),
            duplicate_count: 0,
            literals: AHashSet::new(),
            variable_recurrence: AHashMap::new(),
            polarity_seen: AHashMap::new(),
            clause_lengths: RunningStats::new(),
            positive_per_clause: RunningStats::new(),
            ratio_sum: 0.0,
            ratio_entropy: 0.0,
            clause_events: 0,
            unit_positive: AHashSet::new(),
            unit_negative: AHashSet::new(),
            contradictory_variable: None,
            positive_unit_clauses: 0,
            negative_unit_clauses: 0,
            two_literal_clauses: 0,
            definite_clauses: 0,
            goal_clauses: 0,
            true_trivial: true,
            false_trivial: true,
            tautological_literals: 0,
            tautological_clauses: 0,
            reference_length: None,
            uniform_length: true,
            xor2: AHashSet::new(),
            xor2_count: 0,
            literal_components: None,
            variable_components: None,
            meta,
            report: None,
        }
    }

    /// The finalized report; only available once `release` has run.
    pub fn into_report(self) -> Result<Report> {
        self.report
            .ok_or(Error::Protocol("report requested before release"))
    }

    fn emit_stats(metrics: &mut Metrics, prefix: &str, stats: &RunningStats) {
        metrics.insert(format!("{prefix}_mean"), stats.mean().into());
        metrics.insert(format!("{prefix}_sd"), stats.sd().into());
        metrics.insert(format!("{prefix}_sum"), stats.sum().into());
        metrics.insert(format!("{prefix}_count"), stats.count().into());
        if let (Some(min), Some(max)) = (stats.min(), stats.max()) {
            metrics.insert(format!("{prefix}_smallest"), min.into());
            metrics.insert(format!("{prefix}_largest"), max.into());
        }
    }
}

impl Sink for Analyzer {
    fn header(&mut self, var_count: usize, clause_count: usize) -> Result<()> {
        if self.header.is_some() {
            return Err(Error::Protocol("duplicate header"));
        }
        if clause_count == 0 {
            return Err(Error::EmptyFormula);
        }

        self.header = Some(Header {
            var_count,
            clause_count,
        });
        self.literal_components = Some(UnionFind::new(2 * var_count + 1));
        self.variable_components = Some(UnionFind::new(var_count + 1));
        Ok(())
    }

    fn clause_start(&mut self) -> Result<()> {
        if self.validate && self.header.is_none() {
            return Err(Error::Protocol("clause before header"));
        }
        Ok(())
    }

    fn literal(&mut self, lit: Lit) -> Result<()> {
        if self.validate {
            match self.header {
                Some(header) if to_var(lit) > header.var_count => {
                    return Err(Error::LiteralOutOfBounds {
                        literal: i64::from(lit),
                        var_count: header.var_count,
                    });
                }
                Some(_) => {}
                None => return Err(Error::Protocol("literal before header")),
            }
        }

        let var = to_var(lit);
        self.literals.insert(lit);
        *self.variable_recurrence.entry(var).or_default() += 1;
        *self.polarity_seen.entry(var).or_default() |= if lit > 0 {
            POSITIVE_SEEN
        } else {
            NEGATIVE_SEEN
        };
        Ok(())
    }

    fn clause_end(&mut self, clause: Clause) -> Result<()> {
        let clause = canonicalize(clause);
        let length = clause.len();
        let positive = clause.iter().filter(|&&lit| lit > 0).count();
        let negative = length - positive;

        let is_new = if self.clauses.contains(&clause) {
            warn!("duplicate clause: {clause:?}");
            self.duplicate_count += 1;
            false
        } else {
            self.clauses.insert(clause.clone());
            true
        };

        if is_new {
            self.clause_lengths.push(length as i64);
            self.positive_per_clause.push(positive as i64);

            if let [lit] = clause[..] {
                let var = to_var(lit);
                if lit > 0 {
                    self.unit_positive.insert(var);
                    if self.unit_negative.contains(&var) {
                        self.contradictory_variable = Some(var);
                    }
                } else {
                    self.unit_negative.insert(var);
                    if self.unit_positive.contains(&var) {
                        self.contradictory_variable = Some(var);
                    }
                }
            }
        }

        self.clause_events += 1;
        let ratio = positive as f64 / length as f64;
        self.ratio_sum += ratio;
        if ratio > 0.0 {
            self.ratio_entropy += ratio * ratio.log2();
        }

        match (length, positive) {
            (1, 1) => self.positive_unit_clauses += 1,
            (1, 0) => self.negative_unit_clauses += 1,
            (2, _) => self.two_literal_clauses += 1,
            _ => {}
        }
        if negative == 0 {
            self.false_trivial = false;
        }
        if positive == 0 {
            self.true_trivial = false;
            self.goal_clauses += 1;
        }
        if positive == 1 {
            self.definite_clauses += 1;
        }

        // tautological pairs are adjacent in canonical order
        let tautological = clause.windows(2).filter(|w| w[0] == -w[1]).count();
        self.tautological_literals += tautological as u64;
        if tautological > 0 && 2 * tautological == length {
            self.tautological_clauses += 1;
        }

        match self.reference_length {
            None => self.reference_length = Some(length),
            Some(reference) if reference != length => self.uniform_length = false,
            Some(_) => {}
        }

        if length > 1 {
            if let (Some(lits), Some(vars)) =
                (&mut self.literal_components, &mut self.variable_components)
            {
                let anchor = clause[0];
                for &lit in &clause[1..] {
                    lits.union(lit_node(anchor), lit_node(lit));
                    vars.union(to_var(anchor), to_var(lit));
                }
            }
        }

        if let [a, b] = clause[..] {
            let pair = if a <= b { (a, b) } else { (b, a) };
            if self.xor2.remove(&pair) {
                self.xor2_count += 1;
            } else {
                // remember the sign-flipped counterpart for future matching
                self.xor2.insert((-pair.1, -pair.0));
            }
        }

        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if self.report.is_some() {
            return Err(Error::Protocol("finish called twice"));
        }

        let unique = self.clauses.len();
        let total = unique + self.duplicate_count;

        if self.validate {
            let header = self
                .header
                .ok_or(Error::Protocol("finish before header"))?;
            if self.variable_recurrence.len() != header.var_count {
                return Err(Error::HeaderMismatch {
                    what: "variables",
                    declared: header.var_count,
                    computed: self.variable_recurrence.len(),
                });
            }
            if total != header.clause_count {
                return Err(Error::HeaderMismatch {
                    what: "clauses",
                    declared: header.clause_count,
                    computed: total,
                });
            }
        }
        if self.clauses.is_empty() {
            return Err(Error::EmptyFormula);
        }

        let mut metrics = Metrics::new();

        metrics.insert("clauses_count".into(), total.into());
        metrics.insert("clauses_unique_count".into(), unique.into());
        metrics.insert("literals_unique_count".into(), self.literals.len().into());
        metrics.insert(
            "variables_unique_count".into(),
            self.variable_recurrence.len().into(),
        );

        Self::emit_stats(&mut metrics, "clauses_length", &self.clause_lengths);
        metrics.insert("clauses_length_uniform".into(), self.uniform_length.into());
        metrics.insert("literals_count".into(), self.clause_lengths.sum().into());

        Self::emit_stats(
            &mut metrics,
            "literals_positive_in_clauses",
            &self.positive_per_clause,
        );
        metrics.insert(
            "literals_positive_ratio".into(),
            (self.positive_per_clause.sum() as f64 / self.clause_lengths.sum() as f64).into(),
        );

        let largest = self.variable_recurrence.keys().max().copied();
        let lowest = self.variable_recurrence.keys().min().copied();
        if let (Some(largest), Some(lowest)) = (largest, lowest) {
            metrics.insert("variables_largest".into(), largest.into());
            metrics.insert("variables_lowest".into(), lowest.into());
        }

        let mut recurrence = RunningStats::new();
        recurrence.extend(self.variable_recurrence.values().copied());
        Self::emit_stats(&mut metrics, "variables_recurrence", &recurrence);
        metrics.insert(
            "variables_recurrence_percent".into(),
            (recurrence.mean() / total as f64).into(),
        );

        let mut existential = 0u64;
        let mut existential_positive = 0u64;
        let mut existential_negative = 0u64;
        for &mask in self.polarity_seen.values() {
            match mask {
                POSITIVE_SEEN => {
                    existential += 1;
                    existential_positive += 1;
                }
                NEGATIVE_SEEN => {
                    existential += 1;
                    existential_negative += 1;
                }
                _ => {}
            }
        }
        metrics.insert("literals_existential_count".into(), existential.into());
        if existential_positive > 0 {
            metrics.insert(
                "literals_existential_positive_count".into(),
                existential_positive.into(),
            );
        }
        if existential_negative > 0 {
            metrics.insert(
                "literals_existential_negative_count".into(),
                existential_negative.into(),
            );
        }

        metrics.insert(
            "literals_unit_unique_count".into(),
            (self.unit_positive.len() + self.unit_negative.len()).into(),
        );
        if !self.unit_positive.is_empty() {
            metrics.insert(
                "literals_unit_unique_positive_count".into(),
                self.unit_positive.len().into(),
            );
        }
        if !self.unit_negative.is_empty() {
            metrics.insert(
                "literals_unit_unique_negative_count".into(),
                self.unit_negative.len().into(),
            );
        }
        if let Some(var) = self.contradictory_variable {
            metrics.insert(
                "literals_unit_unique_contradictory_variable".into(),
                var.into(),
            );
        }

        if self.tautological_literals > 0 {
            metrics.insert(
                "tautological_literals".into(),
                self.tautological_literals.into(),
            );
        }
        if self.tautological_clauses > 0 {
            metrics.insert(
                "tautological_clauses".into(),
                self.tautological_clauses.into(),
            );
        }

        // reported component counts exclude the nominal zero bucket
        if let Some(components) = &self.variable_components {
            metrics.insert(
                "connected_components".into(),
                (components.count() - 1).into(),
            );
        }
        if let Some(components) = &self.literal_components {
            metrics.insert(
                "connected_literal_components".into(),
                (components.count() - 1).into(),
            );
        }

        if self.xor2_count > 0 {
            metrics.insert("xor2_count".into(), self.xor2_count.into());
        }

        metrics.insert(
            "positive_unit_clause_count".into(),
            self.positive_unit_clauses.into(),
        );
        metrics.insert(
            "negative_unit_clause_count".into(),
            self.negative_unit_clauses.into(),
        );
        metrics.insert(
            "two_literals_clause_count".into(),
            self.two_literal_clauses.into(),
        );
        metrics.insert("definite_clauses_count".into(), self.definite_clauses.into());
        metrics.insert("goal_clauses_count".into(), self.goal_clauses.into());
        metrics.insert("true_trivial".into(), self.true_trivial.into());
        metrics.insert("false_trivial".into(), self.false_trivial.into());

        metrics.insert(
            "positive_negative_literals_in_clause_ratio_mean".into(),
            (self.ratio_sum / self.clause_events as f64).into(),
        );
        let entropy = if self.ratio_entropy == 0.0 {
            0.0
        } else {
            -self.ratio_entropy
        };
        metrics.insert(
            "positive_negative_literals_in_clause_ratio_entropy".into(),
            entropy.into(),
        );

        self.report = Some(Report {
            meta: std::mem::take(&mut self.meta),
            metrics,
        });
        Ok(())
    }
}

pub const METRICS_DOCUMENTATION: &str = "\
Meta attributes
  time        UTC capture time, ISO 8601 combined date and time format
  filename    base name of the parsed file (full path if so configured)
  md5sum      MD5 digest of the source file, when supplied by the caller
  sha1sum     SHA1 digest of the source file, when supplied by the caller

Clauses
  clauses_count            number of clauses, duplicates included
  clauses_unique_count     number of distinct clauses after canonicalization
  clauses_length_*         smallest/largest/mean/sd/sum/count of clause lengths
  clauses_length_uniform   true if all clauses share one length
  definite_clauses_count   clauses with exactly one positive literal
  goal_clauses_count       clauses with no positive literal
  two_literals_clause_count  clauses of length two
  positive_unit_clause_count / negative_unit_clause_count
                           unit clauses by polarity, duplicates included
  tautological_clauses     clauses pairing every literal with its negation
  xor2_count               {a,b} plus {-a,-b} pairs of two-literal clauses

Literals
  literals_count           total number of literals over distinct clauses
  literals_unique_count    distinct signed literals
  literals_positive_in_clauses_*  distribution of positive literals per clause
  literals_positive_ratio  probability that a random literal is positive
  literals_existential_count            variables with a single polarity
  literals_existential_positive_count   thereof positive-only (if nonzero)
  literals_existential_negative_count   thereof negative-only (if nonzero)
  literals_unit_unique_count            distinct unit clauses
  literals_unit_unique_positive_count / literals_unit_unique_negative_count
                           distinct unit clauses by polarity (if nonzero)
  literals_unit_unique_contradictory_variable
                           a variable with both unit polarities (if any)
  tautological_literals    literal/negation pairs inside single clauses
  positive_negative_literals_in_clause_ratio_mean / ..._entropy
                           per-clause positive-polarity ratio aggregate

Variables
  variables_unique_count   distinct variables
  variables_largest / variables_lowest    extremal variable identifiers
  variables_recurrence_*   distribution of per-variable occurrence counts
  variables_recurrence_percent  mean occurrence count over clause count

Connectivity
  connected_components          variable partition components (zero bucket excluded)
  connected_literal_components  signed-literal partition components
";
