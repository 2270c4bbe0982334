use crate::audio::features::FeatureVector;

/// One row of an ordered decision table.
pub struct Rule<T> {
    pub name: &'static str,
    pub matches: fn(&FeatureVector) -> bool,
    pub emit: fn(&FeatureVector) -> T,
}

/// Ordered list of rules evaluated top to bottom; the first whose predicate
/// holds produces the output, otherwise `fallback` does.
pub struct RuleTable<T: 'static> {
    rules: &'static [Rule<T>],
    fallback: Rule<T>,
}

impl<T: 'static> RuleTable<T> {
    pub const fn new(rules: &'static [Rule<T>], fallback: Rule<T>) -> Self {
        Self { rules, fallback }
    }

    pub fn rule_for(&self, features: &FeatureVector) -> &Rule<T> {
        self.rules
            .iter()
            .find(|rule| (rule.matches)(features))
            .unwrap_or(&self.fallback)
    }

    pub fn evaluate(&self, features: &FeatureVector) -> T {
        (self.rule_for(features).emit)(features)
    }

    pub fn rules(&self) -> impl Iterator<Item = &Rule<T>> {
        self.rules.iter().chain(std::iter::once(&self.fallback))
    }
}
