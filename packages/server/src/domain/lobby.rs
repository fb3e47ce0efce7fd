//! Lobby: Connection Registry + Waiting Pool + Session テーブルの集約
//!
//! 3 つの構造は常にまとめて 1 つのロックの下で変更される（`InMemoryLobbyRepository`）。
//! そのため `request_match` の「確認 -> 取り出し -> Session 作成」や、
//! `unregister` からの Waiting Pool 削除・Session 破棄への連鎖は、他の操作から見て原子的になる。
//!
//! ここにあるのは副作用のない状態遷移だけで、通知の配送は行わない。
//! 誰に何を通知すべきかは戻り値（`TeardownNotice` など）で呼び出し側に返す。

use std::collections::HashMap;

use serde::Serialize;

use super::{
    entity::{Connection, Session, SessionState, WaitingEntry},
    error::{MatchError, RelayError},
    registry::ConnectionRegistry,
    value_object::{ConnectionId, DisplayName, SessionId, TeardownReason, Timestamp, UserId},
    waiting_pool::WaitingPool,
};

/// 相手に見せるユーザー情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerInfo {
    pub user_id: UserId,
    pub display_name: DisplayName,
}

impl From<&Connection> for PeerInfo {
    fn from(connection: &Connection) -> Self {
        Self {
            user_id: connection.user_id.clone(),
            display_name: connection.display_name.clone(),
        }
    }
}

/// `request_match` の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Waiting Pool に入った（または既に入っていた）
    Searching,
    /// 待っていたユーザーとペアになった
    Paired {
        session_id: SessionId,
        me: PeerInfo,
        partner: PeerInfo,
    },
}

/// Session 破棄時に、破棄を起こさなかった側へ届けるべき通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeardownNotice {
    pub session_id: SessionId,
    pub initiator: UserId,
    pub notify: UserId,
    pub reason: TeardownReason,
}

/// `register` の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LobbyRegistration {
    pub connection_id: ConnectionId,
    /// 置き換えた古い接続
    pub superseded: Option<ConnectionId>,
    /// 古い接続が Session 中だった場合の破棄通知
    pub teardown: Option<TeardownNotice>,
}

/// `unregister` の結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Unregistration {
    /// 現在の接続を実際に削除したか（置き換え済み・未知なら false）
    pub removed: bool,
    pub teardown: Option<TeardownNotice>,
}

/// `leave` の結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LeaveOutcome {
    pub left_pool: bool,
    pub teardown: Option<TeardownNotice>,
}

/// 中継先
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub session_id: SessionId,
    pub from: PeerInfo,
    pub partner: UserId,
    /// 相手がまだ Registry にいるか
    pub partner_registered: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LobbyStats {
    pub online: usize,
    pub waiting: usize,
    pub sessions: usize,
}

/// デバッグ用のスナップショット
#[derive(Debug, Clone, Serialize)]
pub struct LobbySnapshot {
    pub connections: Vec<Connection>,
    pub waiting: Vec<WaitingEntry>,
    pub sessions: Vec<Session>,
    pub invariant_violations: Vec<String>,
}

#[derive(Debug, Default)]
pub struct Lobby {
    registry: ConnectionRegistry,
    pool: WaitingPool,
    sessions: HashMap<SessionId, Session>,
}

impl Lobby {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn pool(&self) -> &WaitingPool {
        &self.pool
    }

    pub fn session(&self, session_id: &SessionId) -> Option<&Session> {
        self.sessions.get(session_id)
    }

    pub fn session_of(&self, user_id: &UserId) -> Option<&Session> {
        let session_id = self.registry.lookup(user_id)?.current_session_id.as_ref()?;
        self.sessions.get(session_id)
    }

    /// 接続を登録する。既存の接続があれば置き換え、その接続の待機・Session を片付ける。
    pub fn register(
        &mut self,
        user_id: UserId,
        display_name: DisplayName,
        now: Timestamp,
    ) -> LobbyRegistration {
        let registration = self.registry.register(user_id.clone(), display_name, now);

        let mut teardown = None;
        if let Some(old) = &registration.superseded {
            self.pool.remove(&user_id);
            if let Some(session_id) = &old.current_session_id {
                teardown = self.teardown(session_id, &user_id, TeardownReason::Disconnected);
            }
        }

        LobbyRegistration {
            connection_id: registration.connection_id,
            superseded: registration.superseded.map(|c| c.id),
            teardown,
        }
    }

    /// 接続を削除し、同じ操作の中で Waiting Pool と Session も片付ける。
    ///
    /// 二重呼び出し・未知の ID・置き換え済みの接続に対しては何もしない。
    pub fn unregister(&mut self, user_id: &UserId, connection_id: ConnectionId) -> Unregistration {
        if !self.registry.is_current(user_id, connection_id) {
            self.registry.remove(user_id, connection_id);
            return Unregistration::default();
        }

        let outcome = self.leave_with(user_id, TeardownReason::Disconnected);
        self.registry.remove(user_id, connection_id);

        Unregistration {
            removed: true,
            teardown: outcome.teardown,
        }
    }

    /// Waiting Pool に入れる。既に入っていれば何もしない（`Ok(false)`）。
    pub fn enqueue(&mut self, user_id: &UserId, now: Timestamp) -> Result<bool, MatchError> {
        let connection = self
            .registry
            .lookup_mut(user_id)
            .ok_or_else(|| MatchError::NotRegistered(user_id.to_string()))?;
        if connection.is_in_session() {
            return Err(MatchError::AlreadyInSession);
        }
        connection.in_waiting_pool = true;
        Ok(self.pool.enqueue(user_id.clone(), now))
    }

    /// 最も古い待機ユーザーとペアにする。いなければ Waiting Pool に入れる。
    pub fn request_match(
        &mut self,
        user_id: &UserId,
        now: Timestamp,
    ) -> Result<MatchOutcome, MatchError> {
        let me = self
            .registry
            .lookup(user_id)
            .ok_or_else(|| MatchError::NotRegistered(user_id.to_string()))?;
        if me.is_in_session() {
            return Err(MatchError::AlreadyInSession);
        }
        let me = PeerInfo::from(me);

        while let Some(entry) = self.pool.dequeue_oldest_other_than(user_id) {
            // unregister が Pool も片付けるので、ここで弾かれるエントリは本来存在しない
            let Some(partner) = self
                .registry
                .lookup(&entry.user_id)
                .filter(|c| !c.is_in_session())
            else {
                continue;
            };
            let partner = PeerInfo::from(partner);

            self.pool.remove(user_id);
            let session = Session::new(
                SessionId::generate(),
                partner.user_id.clone(),
                user_id.clone(),
                now,
            );
            let session_id = session.id.clone();
            for participant in [&partner.user_id, user_id] {
                if let Some(connection) = self.registry.lookup_mut(participant) {
                    connection.current_session_id = Some(session_id.clone());
                    connection.in_waiting_pool = false;
                }
            }
            self.sessions.insert(session_id.clone(), session);

            return Ok(MatchOutcome::Paired {
                session_id,
                me,
                partner,
            });
        }

        self.enqueue(user_id, now)?;
        Ok(MatchOutcome::Searching)
    }

    /// 待機中なら Pool から抜け、Session 中なら破棄する。
    pub fn leave(&mut self, user_id: &UserId) -> LeaveOutcome {
        self.leave_with(user_id, TeardownReason::PartnerLeft)
    }

    fn leave_with(&mut self, user_id: &UserId, reason: TeardownReason) -> LeaveOutcome {
        let left_pool = self.pool.remove(user_id);
        let mut session_id = None;
        if let Some(connection) = self.registry.lookup_mut(user_id) {
            connection.in_waiting_pool = false;
            session_id = connection.current_session_id.clone();
        }

        let teardown = session_id.and_then(|id| self.teardown(&id, user_id, reason));
        LeaveOutcome {
            left_pool,
            teardown,
        }
    }

    /// Session を破棄する: `Active -> Ending -> Gone`
    ///
    /// 両参加者の `current_session_id` を消し、テーブルから削除し、
    /// 破棄を起こさなかった側への通知を返す。`Active` でない（既に消えた）Session や、
    /// 参加者でない `initiator` に対しては何もせず `None`。
    pub fn teardown(
        &mut self,
        session_id: &SessionId,
        initiator: &UserId,
        reason: TeardownReason,
    ) -> Option<TeardownNotice> {
        let session = self.sessions.get_mut(session_id)?;
        if session.state != SessionState::Active {
            return None;
        }
        let notify = session.partner_of(initiator)?.clone();
        session.state = SessionState::Ending;

        for participant in [&session.participant_a, &session.participant_b] {
            if let Some(connection) = self.registry.lookup_mut(participant)
                && connection.current_session_id.as_ref() == Some(session_id)
            {
                connection.current_session_id = None;
            }
        }

        session.state = SessionState::Gone;
        self.sessions.remove(session_id);

        Some(TeardownNotice {
            session_id: session_id.clone(),
            initiator: initiator.clone(),
            notify,
            reason,
        })
    }

    /// `from` の Session 相手を引く
    pub fn route(&self, from: &UserId) -> Result<Route, RelayError> {
        let connection = self
            .registry
            .lookup(from)
            .ok_or_else(|| RelayError::NotRegistered(from.to_string()))?;
        let session = connection
            .current_session_id
            .as_ref()
            .and_then(|id| self.sessions.get(id))
            .ok_or(RelayError::NotInSession)?;
        let partner = session
            .partner_of(from)
            .ok_or(RelayError::NotInSession)?
            .clone();

        Ok(Route {
            session_id: session.id.clone(),
            from: PeerInfo::from(connection),
            partner_registered: self.registry.contains(&partner),
            partner,
        })
    }

    /// クライアントが申告したオンライン状態を記録する。未登録なら `false`
    pub fn set_reported_online(&mut self, user_id: &UserId, is_online: bool) -> bool {
        match self.registry.lookup_mut(user_id) {
            Some(connection) => {
                connection.reported_online = is_online;
                true
            }
            None => false,
        }
    }

    /// 各 ID が現在登録されているか（純粋な読み取り）
    pub fn online_statuses<'a>(
        &self,
        user_ids: impl IntoIterator<Item = &'a UserId>,
    ) -> HashMap<UserId, bool> {
        user_ids
            .into_iter()
            .map(|id| (id.clone(), self.registry.contains(id)))
            .collect()
    }

    /// `exclude` 以外の登録済みユーザー
    pub fn user_ids_except(&self, exclude: &UserId) -> Vec<UserId> {
        self.registry
            .user_ids()
            .filter(|id| *id != exclude)
            .cloned()
            .collect()
    }

    pub fn stats(&self) -> LobbyStats {
        LobbyStats {
            online: self.registry.len(),
            waiting: self.pool.len(),
            sessions: self.sessions.len(),
        }
    }

    pub fn snapshot(&self) -> LobbySnapshot {
        let mut connections: Vec<Connection> = self.registry.connections().cloned().collect();
        connections.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        let mut sessions: Vec<Session> = self.sessions.values().cloned().collect();
        sessions.sort_by_key(|s| s.created_at);

        LobbySnapshot {
            connections,
            waiting: self.pool.entries().cloned().collect(),
            sessions,
            invariant_violations: self.invariant_violations(),
        }
    }

    /// 所有関係の不変条件を検査する。空なら整合している。
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        let mut participation: HashMap<&UserId, usize> = HashMap::new();

        for (id, session) in &self.sessions {
            if session.participant_a == session.participant_b {
                violations.push(format!("session {id} pairs {} with itself", session.participant_a));
            }
            if session.state != SessionState::Active {
                violations.push(format!("session {id} is {:?} but still stored", session.state));
            }
            for participant in [&session.participant_a, &session.participant_b] {
                *participation.entry(participant).or_default() += 1;
                match self.registry.lookup(participant) {
                    None => violations.push(format!(
                        "session {id} references unregistered user {participant}"
                    )),
                    Some(c) if c.current_session_id.as_ref() != Some(id) => violations.push(
                        format!("user {participant} does not point back to session {id}"),
                    ),
                    Some(_) => {}
                }
            }
        }
        for (user_id, count) in participation {
            if count > 1 {
                violations.push(format!("user {user_id} is in {count} sessions"));
            }
        }

        for connection in self.registry.connections() {
            if let Some(session_id) = &connection.current_session_id
                && !self
                    .sessions
                    .get(session_id)
                    .is_some_and(|s| s.involves(&connection.user_id))
            {
                violations.push(format!(
                    "user {} points at missing session {session_id}",
                    connection.user_id
                ));
            }
            if connection.in_waiting_pool != self.pool.contains(&connection.user_id) {
                violations.push(format!(
                    "user {} waiting flag disagrees with the pool",
                    connection.user_id
                ));
            }
        }

        for entry in self.pool.entries() {
            match self.registry.lookup(&entry.user_id) {
                None => violations.push(format!(
                    "waiting entry for unregistered user {}",
                    entry.user_id
                )),
                Some(c) if c.is_in_session() => violations.push(format!(
                    "user {} is waiting while in a session",
                    entry.user_id
                )),
                Some(_) => {}
            }
        }

        violations
    }
}
