//! The `Function` sum type and its degree-promoting arithmetic.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::{Add, Mul, Neg, Sub};

/// A monomial: variable ids sorted ascending, possibly repeated.
///
/// `[1, 1, 3]` denotes `x1 * x1 * x3`. The empty monomial denotes the
/// constant term.
pub type Monomial = Vec<u64>;

/// A linear function: `sum(coefficient * x_id) + constant`.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Linear {
    /// Coefficient per variable id.
    pub terms: BTreeMap<u64, f64>,
    /// Constant offset.
    pub constant: f64,
}

impl Linear {
    /// Creates a linear function from a term map and constant.
    pub fn new(terms: BTreeMap<u64, f64>, constant: f64) -> Self {
        Self { terms, constant }
    }

    /// Creates `coefficient * x_id`.
    pub fn single_term(id: u64, coefficient: f64) -> Self {
        Self {
            terms: BTreeMap::from([(id, coefficient)]),
            constant: 0.0,
        }
    }
}

/// A quadratic function: degree-2 terms plus an embedded linear part.
///
/// Degree-2 keys are unordered id pairs stored as `(low, high)`.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Quadratic {
    /// Coefficient per unordered id pair `(low, high)`.
    #[cfg_attr(feature = "serde", serde(with = "term_seq"))]
    pub quad_terms: BTreeMap<(u64, u64), f64>,
    /// The degree <= 1 part.
    pub linear: Linear,
}

impl Quadratic {
    /// Creates a quadratic function from its parts; pair keys are
    /// canonicalized to `(low, high)` and duplicates merged.
    pub fn new(quad_terms: BTreeMap<(u64, u64), f64>, linear: Linear) -> Self {
        let mut canonical = BTreeMap::new();
        for ((i, j), c) in quad_terms {
            let key = if i <= j { (i, j) } else { (j, i) };
            *canonical.entry(key).or_insert(0.0) += c;
        }
        Self {
            quad_terms: canonical,
            linear,
        }
    }
}

/// A general sparse polynomial: coefficient per monomial.
///
/// The empty monomial holds the constant term.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Polynomial {
    /// Coefficient per sorted monomial.
    #[cfg_attr(feature = "serde", serde(with = "term_seq"))]
    pub terms: BTreeMap<Monomial, f64>,
}

impl Polynomial {
    /// Creates a polynomial; monomial keys are sorted and duplicates merged.
    pub fn new(terms: BTreeMap<Monomial, f64>) -> Self {
        let mut canonical = BTreeMap::new();
        for (mut ids, c) in terms {
            ids.sort_unstable();
            *canonical.entry(ids).or_insert(0.0) += c;
        }
        Self { terms: canonical }
    }
}

/// A polynomial function over decision-variable ids, tagged by degree.
///
/// The tag encodes the promotion history, not the live degree:
/// `Linear + Linear` stays `Linear` even if every term cancels, and
/// `Linear * Linear` is `Quadratic` even if the product is affine.
///
/// # Examples
///
/// ```
/// use quboform::algebra::Function;
///
/// // 2*x0 + 3*x1 + 1
/// let f = Function::variable(0).scale(2.0)
///     .add(Function::variable(1).scale(3.0))
///     .add(Function::constant(1.0));
/// assert_eq!(f.degree(), 1);
///
/// // (x0 + 1) * (x0 + 1) is quadratic
/// let g = Function::variable(0).add(Function::constant(1.0));
/// let sq = g.clone().mul(g);
/// assert_eq!(sq.degree(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Function {
    /// A constant.
    Constant(f64),
    /// Degree <= 1.
    Linear(Linear),
    /// Degree <= 2.
    Quadratic(Quadratic),
    /// Arbitrary degree.
    Polynomial(Polynomial),
}

impl Default for Function {
    fn default() -> Self {
        Function::Constant(0.0)
    }
}

impl Function {
    /// The constant function `c`.
    pub fn constant(c: f64) -> Self {
        Function::Constant(c)
    }

    /// The function `x_id`.
    pub fn variable(id: u64) -> Self {
        Function::Linear(Linear::single_term(id, 1.0))
    }

    /// A linear function from a term map and constant.
    pub fn linear(terms: BTreeMap<u64, f64>, constant: f64) -> Self {
        Function::Linear(Linear::new(terms, constant))
    }

    /// The degree tag: 0 for constant, 1 for linear, 2 for quadratic, and
    /// the maximal monomial length for polynomial.
    pub fn degree(&self) -> u32 {
        match self {
            Function::Constant(_) => 0,
            Function::Linear(_) => 1,
            Function::Quadratic(_) => 2,
            Function::Polynomial(p) => p
                .terms
                .keys()
                .map(|m| m.len() as u32)
                .max()
                .unwrap_or(0),
        }
    }

    /// All terms as a canonical monomial map, the constant under the empty
    /// monomial. Duplicate monomials are merged by summing.
    pub fn terms(&self) -> BTreeMap<Monomial, f64> {
        let mut out = BTreeMap::new();
        match self {
            Function::Constant(c) => {
                out.insert(Vec::new(), *c);
            }
            Function::Linear(l) => {
                out.insert(Vec::new(), l.constant);
                for (&id, &c) in &l.terms {
                    *out.entry(vec![id]).or_insert(0.0) += c;
                }
            }
            Function::Quadratic(q) => {
                out.insert(Vec::new(), q.linear.constant);
                for (&id, &c) in &q.linear.terms {
                    *out.entry(vec![id]).or_insert(0.0) += c;
                }
                for (&(i, j), &c) in &q.quad_terms {
                    *out.entry(vec![i, j]).or_insert(0.0) += c;
                }
            }
            Function::Polynomial(p) => {
                for (m, &c) in &p.terms {
                    *out.entry(m.clone()).or_insert(0.0) += c;
                }
                out.entry(Vec::new()).or_insert(0.0);
            }
        }
        out
    }

    /// Ids appearing in at least one term with a nonzero coefficient.
    pub fn used_variable_ids(&self) -> BTreeSet<u64> {
        let mut ids = BTreeSet::new();
        for (monomial, c) in self.terms() {
            if c != 0.0 {
                ids.extend(monomial);
            }
        }
        ids
    }

    /// Promotes this function to at least the given degree tag
    /// (1 = linear, 2 = quadratic, anything higher = polynomial).
    /// Never demotes.
    fn promote(self, degree: u32) -> Function {
        match (self, degree) {
            (f @ Function::Polynomial(_), _) => f,
            (f, d) if f.degree() >= d => f,
            (Function::Constant(c), 1) => Function::Linear(Linear::new(BTreeMap::new(), c)),
            (Function::Constant(c), 2) => Function::Quadratic(Quadratic {
                quad_terms: BTreeMap::new(),
                linear: Linear::new(BTreeMap::new(), c),
            }),
            (Function::Linear(l), 2) => Function::Quadratic(Quadratic {
                quad_terms: BTreeMap::new(),
                linear: l,
            }),
            (f, _) => Function::Polynomial(Polynomial {
                terms: f.terms(),
            }),
        }
    }

    /// Adds two functions. The result's tag is the maximum of the operand
    /// tags; duplicate monomials are merged by summing coefficients, and a
    /// coefficient that merges to exactly zero is retained.
    pub fn add(self, rhs: Function) -> Function {
        // A polynomial operand commits the result to the polynomial tag
        // regardless of its live degree.
        if matches!(self, Function::Polynomial(_)) || matches!(rhs, Function::Polynomial(_)) {
            let mut terms = self.terms();
            for (m, c) in rhs.terms() {
                *terms.entry(m).or_insert(0.0) += c;
            }
            return Function::Polynomial(Polynomial { terms });
        }
        let degree = self.degree().max(rhs.degree());
        match (self.promote(degree), rhs.promote(degree)) {
            (Function::Constant(a), Function::Constant(b)) => Function::Constant(a + b),
            (Function::Linear(mut a), Function::Linear(b)) => {
                a.constant += b.constant;
                for (id, c) in b.terms {
                    *a.terms.entry(id).or_insert(0.0) += c;
                }
                Function::Linear(a)
            }
            (Function::Quadratic(mut a), Function::Quadratic(b)) => {
                a.linear.constant += b.linear.constant;
                for (id, c) in b.linear.terms {
                    *a.linear.terms.entry(id).or_insert(0.0) += c;
                }
                for (key, c) in b.quad_terms {
                    *a.quad_terms.entry(key).or_insert(0.0) += c;
                }
                Function::Quadratic(a)
            }
            // polynomials are handled by the early return above, and
            // promote() yields matching variants for equal degrees
            _ => unreachable!("promote yields matching variants"),
        }
    }

    /// Subtracts `rhs`; same tag rule as [`Function::add`].
    pub fn sub(self, rhs: Function) -> Function {
        self.add(rhs.neg())
    }

    /// Negates every coefficient, keeping the tag.
    pub fn neg(self) -> Function {
        self.scale(-1.0)
    }

    /// Multiplies every coefficient by a scalar, keeping the tag.
    pub fn scale(self, factor: f64) -> Function {
        match self {
            Function::Constant(c) => Function::Constant(c * factor),
            Function::Linear(mut l) => {
                l.constant *= factor;
                for c in l.terms.values_mut() {
                    *c *= factor;
                }
                Function::Linear(l)
            }
            Function::Quadratic(mut q) => {
                q.linear.constant *= factor;
                for c in q.linear.terms.values_mut() {
                    *c *= factor;
                }
                for c in q.quad_terms.values_mut() {
                    *c *= factor;
                }
                Function::Quadratic(q)
            }
            Function::Polynomial(mut p) => {
                for c in p.terms.values_mut() {
                    *c *= factor;
                }
                Function::Polynomial(p)
            }
        }
    }

    /// Multiplies two functions. The result's tag degree is the sum of the
    /// operand tag degrees: constant x f keeps f's tag, linear x linear is
    /// quadratic, and every combination of sum >= 3 is polynomial.
    pub fn mul(self, rhs: Function) -> Function {
        match (self, rhs) {
            (Function::Constant(c), g) | (g, Function::Constant(c)) => g.scale(c),
            (Function::Linear(a), Function::Linear(b)) => {
                let mut quad = BTreeMap::new();
                let mut linear = BTreeMap::new();
                for (&i, &ca) in &a.terms {
                    for (&j, &cb) in &b.terms {
                        let key = if i <= j { (i, j) } else { (j, i) };
                        *quad.entry(key).or_insert(0.0) += ca * cb;
                    }
                }
                for (&i, &ca) in &a.terms {
                    *linear.entry(i).or_insert(0.0) += ca * b.constant;
                }
                for (&j, &cb) in &b.terms {
                    *linear.entry(j).or_insert(0.0) += cb * a.constant;
                }
                Function::Quadratic(Quadratic {
                    quad_terms: quad,
                    linear: Linear::new(linear, a.constant * b.constant),
                })
            }
            // linear x quadratic, quadratic x quadratic, anything x polynomial
            (f, g) => {
                let mut terms: BTreeMap<Monomial, f64> = BTreeMap::new();
                for (ma, ca) in f.terms() {
                    for (mb, cb) in g.terms() {
                        let mut m = ma.clone();
                        m.extend_from_slice(&mb);
                        m.sort_unstable();
                        *terms.entry(m).or_insert(0.0) += ca * cb;
                    }
                }
                Function::Polynomial(Polynomial { terms })
            }
        }
    }

    /// Squares the function; tag degree doubles.
    pub fn squared(&self) -> Function {
        self.clone().mul(self.clone())
    }

    /// Substitutes whole functions for variables: every occurrence of an
    /// id in `replacements` is replaced by its function, products expanded
    /// and merged. The result's tag is at least this function's tag and is
    /// raised further by whatever the replacements introduce.
    pub fn substitute(&self, replacements: &BTreeMap<u64, Function>) -> Function {
        if !self
            .used_variable_ids()
            .iter()
            .any(|id| replacements.contains_key(id))
        {
            return self.clone();
        }
        let mut acc = Function::Constant(0.0);
        for (monomial, coefficient) in self.terms() {
            let mut term = Function::Constant(coefficient);
            for &id in &monomial {
                let factor = replacements
                    .get(&id)
                    .cloned()
                    .unwrap_or_else(|| Function::variable(id));
                term = term.mul(factor);
            }
            acc = acc.add(term);
        }
        if matches!(self, Function::Polynomial(_)) && !matches!(acc, Function::Polynomial(_)) {
            return Function::Polynomial(Polynomial { terms: acc.terms() });
        }
        acc.promote(self.degree())
    }

    /// Compares the merged monomial maps of both sides: equal when, after
    /// dropping terms whose magnitude is below `atol` on either side, the
    /// remaining monomial sets match and corresponding coefficients differ
    /// by at most `atol`.
    pub fn almost_equal(&self, other: &Function, atol: f64) -> bool {
        let keep = |terms: BTreeMap<Monomial, f64>| -> BTreeMap<Monomial, f64> {
            terms.into_iter().filter(|(_, c)| c.abs() >= atol).collect()
        };
        let lhs = keep(self.terms());
        let rhs = keep(other.terms());
        if lhs.len() != rhs.len() {
            return false;
        }
        lhs.iter().all(|(m, a)| match rhs.get(m) {
            Some(b) => (a - b).abs() <= atol,
            None => false,
        })
    }
}

impl Add for Function {
    type Output = Function;
    fn add(self, rhs: Function) -> Function {
        Function::add(self, rhs)
    }
}

impl Sub for Function {
    type Output = Function;
    fn sub(self, rhs: Function) -> Function {
        Function::sub(self, rhs)
    }
}

impl Neg for Function {
    type Output = Function;
    fn neg(self) -> Function {
        Function::neg(self)
    }
}

impl Mul for Function {
    type Output = Function;
    fn mul(self, rhs: Function) -> Function {
        Function::mul(self, rhs)
    }
}

impl From<Linear> for Function {
    fn from(l: Linear) -> Self {
        Function::Linear(l)
    }
}

impl From<Quadratic> for Function {
    fn from(q: Quadratic) -> Self {
        Function::Quadratic(q)
    }
}

impl From<Polynomial> for Function {
    fn from(p: Polynomial) -> Self {
        Function::Polynomial(p)
    }
}

impl From<f64> for Function {
    fn from(c: f64) -> Self {
        Function::Constant(c)
    }
}

/// JSON maps only take string keys, so pair- and monomial-keyed term maps
/// are serialized as ordered `(key, coefficient)` sequences instead.
#[cfg(feature = "serde")]
mod term_seq {
    use std::collections::BTreeMap;

    use serde::de::{Deserialize, Deserializer};
    use serde::ser::{Serialize, Serializer};

    pub fn serialize<K, S>(terms: &BTreeMap<K, f64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        K: Serialize,
        S: Serializer,
    {
        serializer.collect_seq(terms.iter())
    }

    pub fn deserialize<'de, K, D>(deserializer: D) -> Result<BTreeMap<K, f64>, D::Error>
    where
        K: Deserialize<'de> + Ord,
        D: Deserializer<'de>,
    {
        let pairs = Vec::<(K, f64)>::deserialize(deserializer)?;
        Ok(pairs.into_iter().collect())
    }
}
