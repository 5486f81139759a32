//! Send-eligibility decisions.
//!
//! Turns limit, duplicate and exclusivity rules into filter groups, composes
//! them into one predicate and asks the store a single question per call.
//! Every operation is read-only; "nothing found" is `Ok(None)` and a store
//! failure is always an error, never a silent miss.

use crate::config::Config;
use crate::domain::{bitwise_in, AddressTuple, E164PhoneNormalizer, Matching, PhoneNormalizer, Scope};
use crate::error::{CacheError, CacheResult};
use crate::interval::{Clock, IntervalResolver};
use crate::models::{Contact, ContactClient, DuplicateRule, LimitHit, LimitRule, RecordRef};
use crate::observability::{Decision, MetricsTracker};
use crate::query::{compose, dedup_groups, leading_int, Column, FilterGroup, Gate, Value};
use crate::repositories::CacheStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Match service trait for send-eligibility checks.
#[async_trait]
pub trait MatchService: Send + Sync {
    /// The first rule, in order, whose window count strictly exceeds its quantity.
    async fn find_limit(
        &self,
        client: &ContactClient,
        rules: &[LimitRule],
        timezone: Option<&str>,
        send_time: Option<DateTime<Utc>>,
    ) -> CacheResult<Option<LimitHit>>;

    /// A prior send of the same contact to the same client inside any rule's window.
    async fn find_duplicate(
        &self,
        contact: &Contact,
        client: &ContactClient,
        rules: &[DuplicateRule],
        utm_source: Option<&str>,
        timezone: Option<&str>,
        send_time: Option<DateTime<Utc>>,
    ) -> CacheResult<Option<RecordRef>>;

    /// A live exclusivity lock, from any client, covering this contact.
    ///
    /// Pass [`Matching::EXCLUSIVE_DEFAULT`] and [`Scope::EXCLUSIVE_DEFAULT`]
    /// for the standard check; ADDRESS only participates when set explicitly.
    async fn find_exclusive(
        &self,
        contact: &Contact,
        client: &ContactClient,
        send_time: Option<DateTime<Utc>>,
        matching: Matching,
        scope: Scope,
    ) -> CacheResult<Option<RecordRef>>;
}

/// Default implementation of [`MatchService`].
pub struct MatchEngine {
    store: Arc<dyn CacheStore>,
    resolver: IntervalResolver,
    normalizer: Arc<dyn PhoneNormalizer>,
    metrics: MetricsTracker,
}

impl MatchEngine {
    /// Create a new match engine.
    pub fn new(
        store: Arc<dyn CacheStore>,
        resolver: IntervalResolver,
        normalizer: Arc<dyn PhoneNormalizer>,
        metrics: MetricsTracker,
    ) -> Self {
        Self {
            store,
            resolver,
            normalizer,
            metrics,
        }
    }

    /// Create an engine using the configured default timezone and phone
    /// country code.
    pub fn from_config(
        store: Arc<dyn CacheStore>,
        config: &Config,
        clock: Arc<dyn Clock>,
        metrics: MetricsTracker,
    ) -> Self {
        Self::new(
            store,
            IntervalResolver::new(config.default_timezone, clock),
            Arc::new(E164PhoneNormalizer::new(config.phone_country_code)),
            metrics,
        )
    }

    pub fn resolver(&self) -> &IntervalResolver {
        &self.resolver
    }

    pub fn metrics(&self) -> &MetricsTracker {
        &self.metrics
    }

    /// Validate the destination client.
    fn validate_client(client: &ContactClient) -> CacheResult<()> {
        if client.id <= 0 {
            return Err(CacheError::Configuration(format!(
                "Contact client id must be positive, got {}",
                client.id
            )));
        }
        Ok(())
    }

    /// Normalize a raw phone, or `None` when blank or unusable.
    fn phone_value(&self, raw: Option<&str>) -> Option<String> {
        let raw = raw.map(str::trim).filter(|p| !p.is_empty())?;
        match self.normalizer.normalize(raw) {
            Ok(phone) => Some(phone.into_inner()),
            Err(e) => {
                tracing::debug!(error = %e, "Phone not normalizable, skipping dimension");
                None
            }
        }
    }

    /// The window gate for a rule, warning when it reaches past retention.
    fn window(
        &self,
        client: &ContactClient,
        duration: &str,
        timezone: Option<&str>,
        send_time: Option<DateTime<Utc>>,
    ) -> Gate {
        let since = self.resolver.oldest_boundary(duration, timezone, send_time);
        let cutoff = self.resolver.retention_cutoff();
        if since < cutoff {
            tracing::warn!(
                client_id = client.id,
                duration = %duration,
                since = %since,
                cutoff = %cutoff,
                "Rule window reaches past retention, count may be short"
            );
        }
        Gate::Window {
            contactclient_id: client.id,
            since,
        }
    }

    /// Filter group for one limit rule.
    ///
    /// The group always counts the client's window; UTM_SOURCE and CATEGORY
    /// add the rule's value as alternatives when it is usable.
    pub fn limit_filter(
        &self,
        client: &ContactClient,
        rule: &LimitRule,
        timezone: Option<&str>,
        send_time: Option<DateTime<Utc>>,
    ) -> FilterGroup {
        let mut group = FilterGroup::any(self.window(client, &rule.duration, timezone, send_time));
        let value = rule.value.as_deref().map(str::trim).unwrap_or_default();

        if rule.scope.contains(Scope::UTM_SOURCE) && !value.is_empty() {
            group.set(Column::UtmSource, Value::from(value));
        }

        if rule.scope.contains(Scope::CATEGORY) {
            let category = leading_int(value);
            if category != 0 {
                group.set(Column::CategoryId, Value::Int(category));
            }
        }

        group
    }

    /// Filter groups for duplicate rules; rules with nothing to match are dropped.
    pub fn duplicate_filters(
        &self,
        contact: &Contact,
        client: &ContactClient,
        rules: &[DuplicateRule],
        utm_source: Option<&str>,
        timezone: Option<&str>,
        send_time: Option<DateTime<Utc>>,
    ) -> Vec<FilterGroup> {
        let mut groups = Vec::with_capacity(rules.len());

        for (rule_index, rule) in rules.iter().enumerate() {
            let mut group =
                FilterGroup::any(self.window(client, &rule.duration, timezone, send_time));

            if rule.matching.contains(Matching::EXPLICIT) {
                group.set(Column::ContactId, Value::Int(contact.id));
            }

            if rule.matching.contains(Matching::EMAIL) {
                if let Some(email) = contact.trimmed_email() {
                    group.set(Column::Email, Value::from(email));
                }
            }

            if rule.matching.contains(Matching::PHONE) {
                if let Some(phone) = self.phone_value(contact.phone.as_deref()) {
                    group.set(Column::Phone, Value::Text(phone));
                }
            }

            if rule.matching.contains(Matching::MOBILE) {
                if let Some(mobile) = self.phone_value(contact.mobile.as_deref()) {
                    group.set(Column::Mobile, Value::Text(mobile));
                }
            }

            if rule.matching.contains(Matching::ADDRESS) {
                if let Some(address) = AddressTuple::from_contact(contact) {
                    set_address(&mut group, address);
                }
            }

            if rule.scope.contains(Scope::UTM_SOURCE) {
                if let Some(source) = utm_source.map(str::trim).filter(|s| !s.is_empty()) {
                    group.set(Column::UtmSource, Value::from(source));
                }
            }

            if rule.scope.contains(Scope::CATEGORY) {
                if let Some(category) = client.category_id() {
                    group.set(Column::CategoryId, Value::Int(category));
                }
            }

            if group.is_empty() {
                tracing::debug!(
                    client_id = client.id,
                    rule_index = rule_index,
                    "Duplicate rule has no usable dimension"
                );
                continue;
            }

            groups.push(group);
        }

        groups
    }

    /// Filter groups for an exclusivity check.
    ///
    /// One AND-group per active matching dimension, each requiring a recorded
    /// pattern that included the dimension. GLOBAL narrows every group by
    /// scope; CATEGORY then adds a category-locked twin of every group.
    pub fn exclusive_filters(
        &self,
        contact: &Contact,
        client: &ContactClient,
        send_time: Option<DateTime<Utc>>,
        matching: Matching,
        scope: Scope,
    ) -> Vec<FilterGroup> {
        let floor = send_time.unwrap_or_else(|| self.resolver.now());
        let gate = Gate::Expiration { floor };
        let max = matching.bits();
        let mut groups = Vec::new();

        if matching.contains(Matching::EXPLICIT) {
            groups.push(
                FilterGroup::all(gate)
                    .with(Column::ContactId, Value::Int(contact.id))
                    .with(Column::ExclusivePattern, bitwise_in(max, Matching::EXPLICIT.bits())),
            );
        }

        if matching.contains(Matching::EMAIL) {
            if let Some(email) = contact.trimmed_email() {
                groups.push(
                    FilterGroup::all(gate)
                        .with(Column::Email, Value::from(email))
                        .with(Column::ExclusivePattern, bitwise_in(max, Matching::EMAIL.bits())),
                );
            }
        }

        if matching.contains(Matching::PHONE) {
            if let Some(phone) = self.phone_value(contact.phone.as_deref()) {
                groups.push(
                    FilterGroup::all(gate)
                        .with(Column::Phone, Value::Text(phone))
                        .with(Column::ExclusivePattern, bitwise_in(max, Matching::PHONE.bits())),
                );
            }
        }

        if matching.contains(Matching::MOBILE) {
            if let Some(mobile) = self.phone_value(contact.mobile.as_deref()) {
                groups.push(
                    FilterGroup::all(gate)
                        .with(Column::Mobile, Value::Text(mobile))
                        .with(Column::ExclusivePattern, bitwise_in(max, Matching::MOBILE.bits())),
                );
            }
        }

        if matching.contains(Matching::ADDRESS) {
            if let Some(address) = AddressTuple::from_contact(contact) {
                let mut group = FilterGroup::all(gate);
                set_address(&mut group, address);
                group.set(
                    Column::ExclusivePattern,
                    bitwise_in(max, Matching::ADDRESS.bits()),
                );
                groups.push(group);
            }
        }

        if scope.contains(Scope::GLOBAL) {
            let pattern = bitwise_in(scope.bits(), Scope::GLOBAL.bits());
            for group in &mut groups {
                group.set(Column::ExclusiveScope, pattern.clone());
            }
        }

        if scope.contains(Scope::CATEGORY) {
            if let Some(category) = client.category_id() {
                let pattern = bitwise_in(scope.bits(), Scope::CATEGORY.bits());
                let expanded = groups
                    .into_iter()
                    .flat_map(|group| {
                        let locked = group
                            .clone()
                            .with(Column::CategoryId, Value::Int(category))
                            .with(Column::ExclusiveScope, pattern.clone());
                        [group, locked]
                    })
                    .collect();
                groups = dedup_groups(expanded);
            }
        }

        groups
    }

    async fn first_match(
        &self,
        client: &ContactClient,
        groups: &[FilterGroup],
        decision: Decision,
    ) -> CacheResult<Option<RecordRef>> {
        let predicate = match compose(groups) {
            Some(predicate) => predicate,
            None => {
                tracing::debug!(client_id = client.id, "Nothing to match, skipping query");
                return Ok(None);
            }
        };

        tracing::debug!(
            client_id = client.id,
            groups = groups.len(),
            conditions = predicate.leaf_count(),
            "Running existence check"
        );

        let found = self.store.exists_one(&predicate).await.map_err(|e| {
            tracing::warn!(client_id = client.id, error = %e, "Existence check failed");
            CacheError::from(e)
        })?;

        match &found {
            Some(record) => {
                self.metrics.track_decision(decision);
                tracing::debug!(
                    client_id = client.id,
                    record_id = record.id,
                    decision = ?decision,
                    "Match found"
                );
            }
            None => self.metrics.track_decision(Decision::Clear),
        }

        Ok(found)
    }
}

/// Add each address component as its own condition.
fn set_address(group: &mut FilterGroup, address: AddressTuple) {
    group.set(Column::Address1, Value::Text(address.address1));
    let optional = [
        (Column::Address2, address.address2),
        (Column::City, address.city),
        (Column::State, address.state),
        (Column::Zipcode, address.zipcode),
        (Column::Country, address.country),
    ];
    for (column, value) in optional {
        if let Some(value) = value {
            group.set(column, Value::Text(value));
        }
    }
}

#[async_trait]
impl MatchService for MatchEngine {
    async fn find_limit(
        &self,
        client: &ContactClient,
        rules: &[LimitRule],
        timezone: Option<&str>,
        send_time: Option<DateTime<Utc>>,
    ) -> CacheResult<Option<LimitHit>> {
        Self::validate_client(client)?;

        for (rule_index, rule) in rules.iter().enumerate() {
            let group = self.limit_filter(client, rule, timezone, send_time);
            let predicate = match compose(std::slice::from_ref(&group)) {
                Some(predicate) => predicate,
                None => continue,
            };

            let count = self.store.count(&predicate).await.map_err(|e| {
                tracing::warn!(
                    client_id = client.id,
                    rule_index = rule_index,
                    error = %e,
                    "Limit count failed"
                );
                CacheError::from(e)
            })?;

            tracing::debug!(
                client_id = client.id,
                rule_index = rule_index,
                count = count,
                quantity = rule.quantity,
                "Limit rule evaluated"
            );

            if count > rule.quantity {
                self.metrics.track_decision(Decision::LimitHit);
                tracing::info!(
                    client_id = client.id,
                    rule_index = rule_index,
                    count = count,
                    quantity = rule.quantity,
                    "Limit exceeded"
                );
                return Ok(Some(LimitHit {
                    rule: rule.clone(),
                    count,
                }));
            }
        }

        self.metrics.track_decision(Decision::Clear);
        Ok(None)
    }

    async fn find_duplicate(
        &self,
        contact: &Contact,
        client: &ContactClient,
        rules: &[DuplicateRule],
        utm_source: Option<&str>,
        timezone: Option<&str>,
        send_time: Option<DateTime<Utc>>,
    ) -> CacheResult<Option<RecordRef>> {
        Self::validate_client(client)?;

        let groups =
            self.duplicate_filters(contact, client, rules, utm_source, timezone, send_time);
        self.first_match(client, &groups, Decision::Duplicate).await
    }

    async fn find_exclusive(
        &self,
        contact: &Contact,
        client: &ContactClient,
        send_time: Option<DateTime<Utc>>,
        matching: Matching,
        scope: Scope,
    ) -> CacheResult<Option<RecordRef>> {
        Self::validate_client(client)?;

        let groups = self.exclusive_filters(contact, client, send_time, matching, scope);
        self.first_match(client, &groups, Decision::Exclusive).await
    }
}
