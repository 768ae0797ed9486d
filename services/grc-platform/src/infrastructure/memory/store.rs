//! 内存 GRC 存储
//!
//! 单个结构同时实现用户、风险、合规与审计四个仓储接口，共享一把读写锁，
//! 使级联删除与唯一约束在内存中也保持原子

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use grc_auth_core::Role;
use grc_common::{AuditInfo, AuditLogId, CategoryId, ControlId, MappingId, RiskId, UserId};
use grc_errors::{AppError, AppResult};
use tokio::sync::RwLock;

use crate::domain::audit::{
    ActorProfile, AuditEvent, AuditRecord, AuditStats, AuditStore, AuditTrailFilter, FilterUser,
    NewAuditEvent,
};
use crate::domain::compliance::{
    ComplianceControl, ComplianceRepository, MappingView, NewMapping, RiskControlMapping,
};
use crate::domain::risk::{
    NewRisk, Risk, RiskCode, RiskRegisterEntry, RiskRepository, RiskStatus,
};
use crate::domain::user::{User, UserRepository};

/// 风险分类
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskCategory {
    pub category_id: CategoryId,
    pub category_name: String,
    pub nist_csf_domain: Option<String>,
}

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<UserId, User>,
    user_roles: HashMap<UserId, Vec<Role>>,
    categories: BTreeMap<CategoryId, RiskCategory>,
    risks: BTreeMap<RiskId, Risk>,
    controls: BTreeMap<ControlId, ComplianceControl>,
    mappings: BTreeMap<MappingId, RiskControlMapping>,
    audit_logs: Vec<AuditEvent>,
    next_id: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn actor(&self, user_id: Option<UserId>) -> Option<ActorProfile> {
        let user = self.users.get(&user_id?)?;
        Some(ActorProfile {
            full_name: user.full_name.clone(),
            username: user.username.clone(),
            job_title: user.job_title.clone(),
        })
    }

    fn audit_records<'a>(&'a self, events: impl Iterator<Item = &'a AuditEvent>) -> Vec<AuditRecord> {
        let mut records: Vec<AuditRecord> = events
            .map(|event| AuditRecord {
                event: event.clone(),
                actor: self.actor(event.user_id),
            })
            .collect();
        records.sort_by(|a, b| {
            b.event
                .created_at
                .cmp(&a.event.created_at)
                .then(b.event.log_id.cmp(&a.event.log_id))
        });
        records
    }
}

/// 内存 GRC 存储
#[derive(Debug, Default)]
pub struct InMemoryGrcStore {
    state: RwLock<State>,
    audit_unavailable: AtomicBool,
    /// 剩余需要少报的编号读取次数，模拟并发创建者抢先占用编号
    stale_code_reads: AtomicU32,
}

impl InMemoryGrcStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- 数据准备 ----

    /// 添加用户并分配角色
    pub async fn add_user(
        &self,
        username: &str,
        password_hash: &str,
        full_name: &str,
        roles: &[Role],
    ) -> UserId {
        let mut state = self.state.write().await;
        let id = UserId(state.next_id());
        state.users.insert(
            id,
            User {
                id,
                username: username.to_string(),
                password_hash: password_hash.to_string(),
                full_name: full_name.to_string(),
                email: Some(format!("{}@example.com", username)),
                job_title: None,
                department: None,
                is_active: true,
                last_login: None,
            },
        );
        state.user_roles.insert(id, roles.to_vec());
        id
    }

    pub async fn set_user_active(&self, id: UserId, active: bool) {
        if let Some(user) = self.state.write().await.users.get_mut(&id) {
            user.is_active = active;
        }
    }

    pub async fn set_user_roles(&self, id: UserId, roles: &[Role]) {
        self.state.write().await.user_roles.insert(id, roles.to_vec());
    }

    pub async fn remove_user(&self, id: UserId) {
        let mut state = self.state.write().await;
        state.users.remove(&id);
        state.user_roles.remove(&id);
    }

    pub async fn add_category(&self, name: &str, nist_csf_domain: Option<&str>) -> CategoryId {
        let mut state = self.state.write().await;
        let id = CategoryId(state.next_id());
        state.categories.insert(
            id,
            RiskCategory {
                category_id: id,
                category_name: name.to_string(),
                nist_csf_domain: nist_csf_domain.map(str::to_string),
            },
        );
        id
    }

    pub async fn add_control(
        &self,
        code: &str,
        name: &str,
        regulation: &str,
        implementation_status: &str,
    ) -> ControlId {
        let mut state = self.state.write().await;
        let id = ControlId(state.next_id());
        state.controls.insert(
            id,
            ComplianceControl {
                control_id: id,
                control_code: code.to_string(),
                control_name: name.to_string(),
                control_description: None,
                regulation: regulation.to_string(),
                control_category: None,
                implementation_status: implementation_status.to_string(),
                is_mandatory: true,
                is_active: true,
            },
        );
        id
    }

    // ---- 故障注入 ----

    /// 切换审计存储可用性；不可用时 `append` 返回 `StoreUnavailable`
    pub fn set_audit_available(&self, available: bool) {
        self.audit_unavailable.store(!available, Ordering::SeqCst);
    }

    /// 接下来 `reads` 次编号读取返回比实际小 1 的最大序号
    pub fn simulate_code_race(&self, reads: u32) {
        self.stale_code_reads.store(reads, Ordering::SeqCst);
    }

    // ---- 观察 ----

    /// 全部审计事件，按写入顺序
    pub async fn audit_events(&self) -> Vec<AuditEvent> {
        self.state.read().await.audit_logs.clone()
    }

    pub async fn audit_actions(&self) -> Vec<String> {
        self.state
            .read()
            .await
            .audit_logs
            .iter()
            .map(|e| e.action.clone())
            .collect()
    }

    pub async fn risk_count(&self) -> usize {
        self.state.read().await.risks.len()
    }

    pub async fn mapping_count(&self) -> usize {
        self.state.read().await.mappings.len()
    }

    pub async fn user(&self, id: UserId) -> Option<User> {
        self.state.read().await.users.get(&id).cloned()
    }

    fn take_stale_read(&self) -> bool {
        self.stale_code_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl UserRepository for InMemoryGrcStore {
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self
            .state
            .read()
            .await
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_roles(&self, id: UserId) -> AppResult<Vec<Role>> {
        Ok(self
            .state
            .read()
            .await
            .user_roles
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }

    async fn update_last_login(&self, id: UserId, at: DateTime<Utc>) -> AppResult<()> {
        if let Some(user) = self.state.write().await.users.get_mut(&id) {
            user.last_login = Some(at);
        }
        Ok(())
    }
}

#[async_trait]
impl RiskRepository for InMemoryGrcStore {
    async fn max_code_sequence(&self, year: i32) -> AppResult<Option<u32>> {
        let max = self
            .state
            .read()
            .await
            .risks
            .values()
            .filter_map(|r| RiskCode::sequence_for_year(r.code.as_str(), year))
            .max();

        if self.take_stale_read() {
            return Ok(max.and_then(|m| m.checked_sub(1)).filter(|m| *m > 0));
        }
        Ok(max)
    }

    async fn insert(
        &self,
        code: &RiskCode,
        risk: &NewRisk,
        created_by: Option<UserId>,
        now: DateTime<Utc>,
    ) -> AppResult<RiskId> {
        let mut state = self.state.write().await;

        if state.risks.values().any(|r| &r.code == code) {
            return Err(AppError::duplicate("Violates risks_risk_code_key"));
        }
        if !state.categories.contains_key(&risk.category_id) {
            return Err(AppError::validation("Unknown risk category."));
        }
        if !state.users.contains_key(&risk.owner_id) {
            return Err(AppError::validation("Unknown risk owner."));
        }

        let id = RiskId(state.next_id());
        state.risks.insert(
            id,
            Risk {
                id,
                code: code.clone(),
                title: risk.title.clone(),
                description: risk.description.clone(),
                category_id: risk.category_id,
                owner_id: risk.owner_id,
                probability: risk.probability,
                impact: risk.impact,
                status: RiskStatus::Identified,
                treatment_type: risk.treatment_type,
                mitigation_plan: risk.mitigation_plan.clone(),
                business_impact: risk.business_impact.clone(),
                review_date: risk.review_date,
                audit_info: AuditInfo::new(created_by, now),
            },
        );
        Ok(id)
    }

    async fn find_by_id(&self, id: RiskId) -> AppResult<Option<Risk>> {
        Ok(self.state.read().await.risks.get(&id).cloned())
    }

    async fn update_status(&self, id: RiskId, status: RiskStatus, now: DateTime<Utc>) -> AppResult<bool> {
        match self.state.write().await.risks.get_mut(&id) {
            Some(risk) => {
                risk.status = status;
                risk.audit_info.touch(now);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_with_mappings(&self, id: RiskId) -> AppResult<bool> {
        let mut state = self.state.write().await;
        if state.risks.remove(&id).is_none() {
            return Ok(false);
        }
        state.mappings.retain(|_, m| m.risk_id != id);
        Ok(true)
    }

    async fn list_register(&self) -> AppResult<Vec<RiskRegisterEntry>> {
        let state = self.state.read().await;
        let mut entries: Vec<RiskRegisterEntry> = state
            .risks
            .values()
            .map(|risk| {
                let category = state.categories.get(&risk.category_id);
                let owner = state.users.get(&risk.owner_id);
                RiskRegisterEntry {
                    risk: risk.clone(),
                    category_name: category.map(|c| c.category_name.clone()).unwrap_or_default(),
                    nist_csf_domain: category.and_then(|c| c.nist_csf_domain.clone()),
                    owner_name: owner.map(|u| u.full_name.clone()).unwrap_or_default(),
                    owner_title: owner.and_then(|u| u.job_title.clone()),
                    owner_department: owner.and_then(|u| u.department.clone()),
                }
            })
            .collect();

        entries.sort_by(|a, b| {
            b.risk
                .score()
                .cmp(&a.risk.score())
                .then(b.risk.created_at().cmp(&a.risk.created_at()))
                .then(b.risk.id.cmp(&a.risk.id))
        });
        Ok(entries)
    }
}

#[async_trait]
impl ComplianceRepository for InMemoryGrcStore {
    async fn list_active_controls(&self) -> AppResult<Vec<ComplianceControl>> {
        let mut controls: Vec<ComplianceControl> = self
            .state
            .read()
            .await
            .controls
            .values()
            .filter(|c| c.is_active)
            .cloned()
            .collect();
        controls.sort_by(|a, b| {
            a.regulation
                .cmp(&b.regulation)
                .then(a.control_code.cmp(&b.control_code))
        });
        Ok(controls)
    }

    async fn find_control(&self, id: ControlId) -> AppResult<Option<ComplianceControl>> {
        Ok(self.state.read().await.controls.get(&id).cloned())
    }

    async fn mapping_counts(&self) -> AppResult<HashMap<ControlId, u32>> {
        let mut counts = HashMap::new();
        for mapping in self.state.read().await.mappings.values() {
            *counts.entry(mapping.control_id).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn find_mapping(
        &self,
        risk_id: RiskId,
        control_id: ControlId,
    ) -> AppResult<Option<RiskControlMapping>> {
        Ok(self
            .state
            .read()
            .await
            .mappings
            .values()
            .find(|m| m.risk_id == risk_id && m.control_id == control_id)
            .cloned())
    }

    async fn insert_mapping(&self, mapping: &NewMapping) -> AppResult<MappingId> {
        let mut state = self.state.write().await;

        if state
            .mappings
            .values()
            .any(|m| m.risk_id == mapping.risk_id && m.control_id == mapping.control_id)
        {
            return Err(AppError::duplicate("Violates uq_risk_control"));
        }
        if !state.risks.contains_key(&mapping.risk_id) || !state.controls.contains_key(&mapping.control_id) {
            return Err(AppError::validation("Mapping references a missing risk or control."));
        }

        let id = MappingId(state.next_id());
        state.mappings.insert(
            id,
            RiskControlMapping {
                mapping_id: id,
                risk_id: mapping.risk_id,
                control_id: mapping.control_id,
                mapping_type: mapping.mapping_type,
                mapped_by: mapping.mapped_by,
                mapped_at: mapping.mapped_at,
            },
        );
        Ok(id)
    }

    async fn delete_mapping(&self, mapping_id: MappingId, risk_id: RiskId) -> AppResult<bool> {
        let mut state = self.state.write().await;
        let matches = state
            .mappings
            .get(&mapping_id)
            .is_some_and(|m| m.risk_id == risk_id);
        if matches {
            state.mappings.remove(&mapping_id);
        }
        Ok(matches)
    }

    async fn list_mappings(&self, risk_id: RiskId) -> AppResult<Vec<MappingView>> {
        let state = self.state.read().await;
        let mut views: Vec<MappingView> = state
            .mappings
            .values()
            .filter(|m| m.risk_id == risk_id)
            .filter_map(|m| {
                let control = state.controls.get(&m.control_id)?;
                Some(MappingView {
                    mapping_id: m.mapping_id,
                    mapping_type: m.mapping_type,
                    mapped_at: m.mapped_at,
                    control_id: control.control_id,
                    control_code: control.control_code.clone(),
                    control_name: control.control_name.clone(),
                    regulation: control.regulation.clone(),
                })
            })
            .collect();
        views.sort_by(|a, b| {
            a.regulation
                .cmp(&b.regulation)
                .then(a.control_code.cmp(&b.control_code))
        });
        Ok(views)
    }
}

#[async_trait]
impl AuditStore for InMemoryGrcStore {
    async fn append(&self, event: NewAuditEvent) -> AppResult<AuditLogId> {
        if self.audit_unavailable.load(Ordering::SeqCst) {
            return Err(AppError::store_unavailable("audit store is offline"));
        }
        let mut state = self.state.write().await;
        let id = AuditLogId(state.next_id());
        state.audit_logs.push(AuditEvent::from_new(id, event));
        Ok(id)
    }

    async fn query(&self, filter: &AuditTrailFilter, limit: u32) -> AppResult<Vec<AuditRecord>> {
        let state = self.state.read().await;
        let mut records = state.audit_records(
            state
                .audit_logs
                .iter()
                .filter(|e| filter.matches(e.user_id, &e.action, e.created_at)),
        );
        records.truncate(limit as usize);
        Ok(records)
    }

    async fn stats(&self, filter: &AuditTrailFilter) -> AppResult<AuditStats> {
        let state = self.state.read().await;
        let matching: Vec<&AuditEvent> = state
            .audit_logs
            .iter()
            .filter(|e| filter.matches(e.user_id, &e.action, e.created_at))
            .collect();

        let users: BTreeSet<UserId> = matching.iter().filter_map(|e| e.user_id).collect();
        let actions: BTreeSet<&str> = matching.iter().map(|e| e.action.as_str()).collect();

        Ok(AuditStats {
            total_events: matching.len() as i64,
            distinct_users: users.len() as i64,
            distinct_actions: actions.len() as i64,
            last_activity: matching.iter().map(|e| e.created_at).max(),
        })
    }

    async fn distinct_actions(&self) -> AppResult<Vec<String>> {
        let actions: BTreeSet<String> = self
            .state
            .read()
            .await
            .audit_logs
            .iter()
            .map(|e| e.action.clone())
            .collect();
        Ok(actions.into_iter().collect())
    }

    async fn active_users(&self) -> AppResult<Vec<FilterUser>> {
        let state = self.state.read().await;
        let mut users: Vec<FilterUser> = state
            .users
            .values()
            .filter(|u| u.is_active)
            .map(|u| FilterUser {
                user_id: u.id,
                full_name: u.full_name.clone(),
            })
            .collect();
        users.sort_by(|a, b| a.full_name.cmp(&b.full_name).then(a.user_id.cmp(&b.user_id)));
        Ok(users)
    }

    async fn export(&self, since: DateTime<Utc>) -> AppResult<Vec<AuditRecord>> {
        let state = self.state.read().await;
        Ok(state.audit_records(state.audit_logs.iter().filter(|e| e.created_at >= since)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::compliance::MappingType;
    use crate::domain::risk::{Rating, TreatmentType};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 1, 10, 0, 0).unwrap()
    }

    async fn seeded() -> (InMemoryGrcStore, NewRisk) {
        let store = InMemoryGrcStore::new();
        let owner = store.add_user("owner", "hash", "Risk Owner", &[Role::RiskManager]).await;
        let category = store.add_category("Technology", Some("Protect")).await;
        let risk = NewRisk {
            title: "Ransomware outbreak".to_string(),
            description: None,
            category_id: category,
            owner_id: owner,
            probability: Rating::new(4).unwrap(),
            impact: Rating::new(5).unwrap(),
            treatment_type: TreatmentType::Mitigate,
            mitigation_plan: None,
            business_impact: None,
            review_date: None,
        };
        (store, risk)
    }

    #[tokio::test]
    async fn test_duplicate_code_is_rejected() {
        let (store, risk) = seeded().await;
        let code = RiskCode::new(2026, 1);
        store.insert(&code, &risk, None, now()).await.unwrap();

        let err = store.insert(&code, &risk, None, now()).await.unwrap_err();
        assert!(err.is_duplicate());
        assert_eq!(store.risk_count().await, 1);
    }

    #[tokio::test]
    async fn test_delete_cascades_to_mappings() {
        let (store, risk) = seeded().await;
        let risk_id = store.insert(&RiskCode::new(2026, 1), &risk, None, now()).await.unwrap();
        let control = store.add_control("A.5.1", "Policies", "ISO 27001", "Implemented").await;
        store
            .insert_mapping(&NewMapping {
                risk_id,
                control_id: control,
                mapping_type: MappingType::Mitigating,
                mapped_by: None,
                mapped_at: now(),
            })
            .await
            .unwrap();

        assert!(store.delete_with_mappings(risk_id).await.unwrap());
        assert_eq!(store.mapping_count().await, 0);
        assert!(!store.delete_with_mappings(risk_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_stale_code_read() {
        let (store, risk) = seeded().await;
        store.insert(&RiskCode::new(2026, 1), &risk, None, now()).await.unwrap();
        store.insert(&RiskCode::new(2026, 2), &risk, None, now()).await.unwrap();

        store.simulate_code_race(1);
        assert_eq!(store.max_code_sequence(2026).await.unwrap(), Some(1));
        assert_eq!(store.max_code_sequence(2026).await.unwrap(), Some(2));
        assert_eq!(store.max_code_sequence(2025).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_audit_outage() {
        let store = InMemoryGrcStore::new();
        let event = NewAuditEvent {
            user_id: None,
            action: "USER_LOGIN".to_string(),
            entity_type: None,
            entity_id: None,
            details: "{}".to_string(),
            ip_address: None,
            created_at: now(),
        };

        store.set_audit_available(false);
        assert!(store.append(event.clone()).await.unwrap_err().is_transient());

        store.set_audit_available(true);
        store.append(event).await.unwrap();
        assert_eq!(store.audit_actions().await, vec!["USER_LOGIN"]);
    }
}
