use std::collections::BTreeMap;

use derive_more::Display;
use log::trace;

use crate::models::variables::{Domain, VarGroup, VarKey};

/// Tolerance used when checking a pinned value against its domain
const DOMAIN_TOLERANCE: f64 = 1e-6;

/// A value that does not lie in the domain of the variable it was meant for.
#[derive(Debug, Clone, Copy, PartialEq, Display)]
#[display(fmt = "cannot pin {} to {} in a {:?} domain", key, value, domain)]
pub struct DomainMismatch {
    pub key: VarKey,
    pub value: f64,
    pub domain: Domain,
}

impl std::error::Error for DomainMismatch {}

/// The domain each variable group takes in a sub-model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainPolicy {
    domains: BTreeMap<VarGroup, Domain>,
}

impl DomainPolicy {
    /// Every group in its declared domain, i.e. the exact model
    pub fn declared() -> Self {
        DomainPolicy {
            domains: VarGroup::ALL
                .iter()
                .map(|g| (*g, g.declared_domain()))
                .collect(),
        }
    }

    /// Every group continuous, i.e. the linear relaxation
    pub fn relaxed() -> Self {
        DomainPolicy {
            domains: VarGroup::ALL
                .iter()
                .map(|g| (*g, Domain::Continuous))
                .collect(),
        }
    }

    pub fn domain(&self, group: VarGroup) -> Domain {
        self.domains
            .get(&group)
            .copied()
            .unwrap_or_else(|| group.declared_domain())
    }

    /// Switch a whole group to `domain`
    pub fn promote(&mut self, group: VarGroup, domain: Domain) {
        self.domains.insert(group, domain);
    }

    pub fn with(mut self, group: VarGroup, domain: Domain) -> Self {
        self.promote(group, domain);
        self
    }
}

/// Which variables are pinned to which values, and which individual variables have their
/// domain overridden. Every change bumps the version.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixingState {
    pinned: BTreeMap<VarKey, f64>,
    overrides: BTreeMap<VarKey, Domain>,
    version: u64,
}

impl FixingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// The domain a value must respect when pinning `key`: the override if there is one,
    /// otherwise the declared domain of its group.
    fn pin_domain(&self, key: &VarKey) -> Domain {
        self.overrides
            .get(key)
            .copied()
            .unwrap_or_else(|| key.group().declared_domain())
    }

    fn admits(domain: Domain, value: f64) -> bool {
        match domain {
            Domain::Binary => {
                value.abs() <= DOMAIN_TOLERANCE || (value - 1.0).abs() <= DOMAIN_TOLERANCE
            }
            Domain::Continuous => value >= -DOMAIN_TOLERANCE,
        }
    }

    /// Pin `key` to `value`. Pinning a variable to the value it already has is a no-op.
    pub fn try_fix(&mut self, key: VarKey, value: f64) -> Result<(), DomainMismatch> {
        let domain = self.pin_domain(&key);
        if !Self::admits(domain, value) {
            return Err(DomainMismatch { key, value, domain });
        }

        if self.pinned.get(&key) != Some(&value) {
            trace!("pin {key} = {value}");
            self.pinned.insert(key, value);
            self.version += 1;
        }

        Ok(())
    }

    /// Like `try_fix`, but a value outside the domain is a bug in the caller.
    pub fn fix(&mut self, key: VarKey, value: f64) {
        if let Err(e) = self.try_fix(key, value) {
            panic!("{e}");
        }
    }

    /// Pin a value read back from a solver: binary values are rounded and continuous values
    /// are clamped at zero before pinning.
    pub fn fix_rounded(&mut self, key: VarKey, value: f64) {
        let value = match self.pin_domain(&key) {
            Domain::Binary => value.round(),
            Domain::Continuous => value.max(0.0),
        };
        self.fix(key, value)
    }

    pub fn fix_all<'a, I: IntoIterator<Item = (&'a VarKey, f64)>>(&mut self, values: I) {
        for (key, value) in values {
            self.fix_rounded(*key, value);
        }
    }

    /// Release a pin. Returns the value it was pinned to.
    pub fn unfix(&mut self, key: &VarKey) -> Option<f64> {
        let value = self.pinned.remove(key);
        if value.is_some() {
            self.version += 1;
        }
        value
    }

    /// Release every pin matching `predicate`. Returns the number of released pins.
    pub fn unfix_where<F: FnMut(&VarKey) -> bool>(&mut self, mut predicate: F) -> usize {
        let before = self.pinned.len();
        self.pinned.retain(|key, _| !predicate(key));
        let released = before - self.pinned.len();
        if released > 0 {
            self.version += 1;
        }
        released
    }

    /// Override the domain of a single variable. Fails if the variable is pinned to a value
    /// outside the new domain.
    pub fn set_domain(&mut self, key: VarKey, domain: Domain) -> Result<(), DomainMismatch> {
        if let Some(&value) = self.pinned.get(&key) {
            if !Self::admits(domain, value) {
                return Err(DomainMismatch { key, value, domain });
            }
        }
        if self.overrides.insert(key, domain) != Some(domain) {
            self.version += 1;
        }
        Ok(())
    }

    pub fn clear_domain(&mut self, key: &VarKey) {
        if self.overrides.remove(key).is_some() {
            self.version += 1;
        }
    }

    /// The domain `key` takes in a sub-model built under `policy`
    pub fn domain(&self, key: &VarKey, policy: &DomainPolicy) -> Domain {
        self.overrides
            .get(key)
            .copied()
            .unwrap_or_else(|| policy.domain(key.group()))
    }

    pub fn value(&self, key: &VarKey) -> Option<f64> {
        self.pinned.get(key).copied()
    }

    pub fn is_fixed(&self, key: &VarKey) -> bool {
        self.pinned.contains_key(key)
    }

    pub fn pinned(&self) -> impl Iterator<Item = (&VarKey, f64)> + '_ {
        self.pinned.iter().map(|(k, v)| (k, *v))
    }

    pub fn len(&self) -> usize {
        self.pinned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pinned.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{build_sub_model, ModelScope},
        problem::tests::tiny,
    };

    const Y: VarKey = VarKey::Setup { item: 0, period: 1 };
    const S: VarKey = VarKey::Inventory {
        item: 0,
        location: 0,
        period: 1,
    };

    #[test]
    fn fixing_is_idempotent() {
        let mut fixing = FixingState::new();
        fixing.fix(Y, 1.0);
        let once = fixing.clone();
        fixing.fix(Y, 1.0);
        assert_eq!(fixing, once);
        assert_eq!(fixing.len(), 1);

        let model = build_sub_model(&tiny(), &fixing, &DomainPolicy::declared(), &ModelScope::Full);
        let pins = model
            .constraints()
            .iter()
            .filter(|c| c.name == "fix_Y_1_2")
            .count();
        assert_eq!(pins, 1);
    }

    #[test]
    fn fix_then_unfix_restores_domain() {
        let policy = DomainPolicy::relaxed();
        let mut fixing = FixingState::new();
        let before = fixing.domain(&Y, &policy);

        fixing.fix(Y, 0.0);
        assert_eq!(fixing.unfix(&Y), Some(0.0));

        assert_eq!(fixing.domain(&Y, &policy), before);
        assert!(fixing.is_empty());
        assert!(fixing.value(&Y).is_none());
    }

    #[test]
    fn binary_pins_must_be_integral() {
        let mut fixing = FixingState::new();
        assert!(matches!(
            fixing.try_fix(Y, 0.4),
            Err(DomainMismatch {
                domain: Domain::Binary,
                ..
            })
        ));
        assert!(fixing.try_fix(S, 0.4).is_ok());
        assert!(fixing.try_fix(S, -3.0).is_err());
    }

    #[test]
    fn rounding_before_pinning() {
        let mut fixing = FixingState::new();
        fixing.fix_rounded(Y, 0.9999997);
        fixing.fix_rounded(S, -1e-12);
        assert_eq!(fixing.value(&Y), Some(1.0));
        assert_eq!(fixing.value(&S), Some(0.0));
    }

    #[test]
    fn domain_override_cannot_contradict_pin() {
        let mut fixing = FixingState::new();
        fixing.fix(S, 2.5);
        assert!(fixing.set_domain(S, Domain::Binary).is_err());
        fixing.fix(S, 1.0);
        assert!(fixing.set_domain(S, Domain::Binary).is_ok());
        assert_eq!(fixing.domain(&S, &DomainPolicy::declared()), Domain::Binary);
        fixing.clear_domain(&S);
        assert_eq!(
            fixing.domain(&S, &DomainPolicy::declared()),
            Domain::Continuous
        );
    }

    #[test]
    fn unfix_where_releases_matching_pins() {
        let mut fixing = FixingState::new();
        for period in 0..5 {
            fixing.fix(VarKey::Setup { item: 0, period }, 1.0);
        }
        assert_eq!(fixing.unfix_where(|k| k.period() >= 3), 2);
        assert_eq!(fixing.len(), 3);
    }

    #[test]
    fn policy_promotion() {
        let policy = DomainPolicy::relaxed().with(VarGroup::Setup, Domain::Binary);
        assert_eq!(policy.domain(VarGroup::Setup), Domain::Binary);
        assert_eq!(policy.domain(VarGroup::Assign), Domain::Continuous);
    }
}
