use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use deadpool_redis::{Config, Connection, Pool, Runtime};
use redis::{AsyncCommands, Script};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_models::{
    Appointment, AppointmentStatus, Doctor, Hold, Patient, PatientDetails, Slot, SlotTransition,
};

use crate::error::{StoreError, StoreResult};
use crate::store::SchedulingStore;

// Records are stored as JSON strings. Guarded updates run as Lua scripts so
// the check and the write happen inside one server-side step.

/// KEYS: slot. ARGV: expected status, expected holder or '', expected
/// held_until or '', new status, new holder or '', new held_until or '',
/// updated_at.
const TRANSITION_SLOT: &str = r#"
local raw = redis.call('GET', KEYS[1])
if not raw then return false end
local slot = cjson.decode(raw)
if slot.status ~= ARGV[1] then return false end
if ARGV[2] ~= '' and slot.held_by ~= ARGV[2] then return false end
if ARGV[3] ~= '' and slot.held_until ~= ARGV[3] then return false end
slot.status = ARGV[4]
if ARGV[5] == '' then slot.held_by = nil else slot.held_by = ARGV[5] end
if ARGV[6] == '' then slot.held_until = nil else slot.held_until = ARGV[6] end
slot.updated_at = ARGV[7]
local encoded = cjson.encode(slot)
redis.call('SET', KEYS[1], encoded)
return encoded
"#;

/// KEYS: slot, hold, expiry index. ARGV: holder, held_until, updated_at,
/// hold json, hold ttl ms, expiry score ms.
const PLACE_HOLD: &str = r#"
local raw = redis.call('GET', KEYS[1])
if not raw then return false end
local slot = cjson.decode(raw)
if slot.status ~= 'available' then return false end
slot.status = 'held'
slot.held_by = ARGV[1]
slot.held_until = ARGV[2]
slot.updated_at = ARGV[3]
local encoded = cjson.encode(slot)
redis.call('SET', KEYS[1], encoded)
redis.call('SET', KEYS[2], ARGV[4], 'PX', ARGV[5])
redis.call('ZADD', KEYS[3], ARGV[6], ARGV[4])
return encoded
"#;

/// KEYS: patient. ARGV: fresh patient json, name, email, phone, updated_at.
const UPSERT_PATIENT: &str = r#"
local raw = redis.call('GET', KEYS[1])
local patient
if raw then
  patient = cjson.decode(raw)
  patient.name = ARGV[2]
  patient.email = ARGV[3]
  patient.phone = ARGV[4]
  patient.updated_at = ARGV[5]
else
  patient = cjson.decode(ARGV[1])
end
local encoded = cjson.encode(patient)
redis.call('SET', KEYS[1], encoded)
return encoded
"#;

/// KEYS: appointment. ARGV: expected status, new status, updated_at.
const TRANSITION_APPOINTMENT: &str = r#"
local raw = redis.call('GET', KEYS[1])
if not raw then return false end
local appointment = cjson.decode(raw)
if appointment.status ~= ARGV[1] then return false end
appointment.status = ARGV[2]
appointment.updated_at = ARGV[3]
local encoded = cjson.encode(appointment)
redis.call('SET', KEYS[1], encoded)
return encoded
"#;

/// KEYS: appointment. ARGV: event id, updated_at.
const SET_CALENDAR_EVENT: &str = r#"
local raw = redis.call('GET', KEYS[1])
if not raw then return false end
local appointment = cjson.decode(raw)
appointment.calendar_event_id = ARGV[1]
appointment.updated_at = ARGV[2]
local encoded = cjson.encode(appointment)
redis.call('SET', KEYS[1], encoded)
return encoded
"#;

pub struct RedisStore {
    pool: Pool,
    prefix: String,
    hold_ttl_ms: u64,
}

impl RedisStore {
    pub async fn new(config: &AppConfig) -> StoreResult<Self> {
        let redis_url = config
            .redis_url
            .clone()
            .ok_or_else(|| StoreError::NotConfigured("REDIS_URL is required for redis storage".to_string()))?;

        let pool = Config::from_url(redis_url)
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| StoreError::Pool(format!("Pool creation error: {}", e)))?;

        let store = Self {
            pool,
            prefix: config.redis_key_prefix.clone(),
            hold_ttl_ms: u64::try_from(config.hold_record_ttl().as_millis()).unwrap_or(u64::MAX),
        };

        store.ping().await?;
        info!("Redis scheduling store initialized (prefix '{}')", store.prefix);

        Ok(store)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    async fn connection(&self) -> StoreResult<Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::Pool(format!("Failed to get Redis connection: {}", e)))
    }

    fn key(&self, parts: &[&str]) -> String {
        let mut key = self.prefix.clone();
        for part in parts {
            key.push(':');
            key.push_str(part);
        }
        key
    }

    fn doctor_key(&self, doctor_id: &str) -> String {
        self.key(&["doctor", doctor_id])
    }

    fn doctors_key(&self) -> String {
        self.key(&["doctors"])
    }

    fn slot_key(&self, slot_id: &str) -> String {
        self.key(&["slot", slot_id])
    }

    fn day_key(&self, doctor_id: &str, date: NaiveDate) -> String {
        self.key(&["slots", doctor_id, &date.format("%Y-%m-%d").to_string()])
    }

    fn hold_key(&self, hold_id: &str) -> String {
        self.key(&["hold", hold_id])
    }

    fn hold_expiry_key(&self) -> String {
        self.key(&["holds", "expiry"])
    }

    fn patient_key(&self, patient_id: &str) -> String {
        self.key(&["patient", patient_id])
    }

    fn appointment_key(&self, appointment_id: &str) -> String {
        self.key(&["appointment", appointment_id])
    }

    fn patient_appointments_key(&self, patient_id: &str) -> String {
        self.key(&["appointments", "patient", patient_id])
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn.get(key).await?;
        raw.map(|data| decode(key, &data)).transpose()
    }

    async fn mget_json<T: DeserializeOwned>(&self, keys: &[String]) -> StoreResult<Vec<T>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.connection().await?;
        let raws: Vec<Option<String>> = redis::cmd("MGET").arg(keys).query_async(&mut conn).await?;

        keys.iter()
            .zip(raws)
            .filter_map(|(key, raw)| raw.map(|data| decode(key, &data)))
            .collect()
    }
}

fn decode<T: DeserializeOwned>(key: &str, data: &str) -> StoreResult<T> {
    serde_json::from_str(data).map_err(|e| StoreError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

/// The exact string serde writes for a timestamp, so script comparisons see
/// the same text that is stored in the record.
fn timestamp_arg(at: &DateTime<Utc>) -> StoreResult<String> {
    match serde_json::to_value(at)? {
        Value::String(text) => Ok(text),
        other => Err(StoreError::Corrupt {
            key: "timestamp".to_string(),
            reason: format!("unexpected encoding {}", other),
        }),
    }
}

fn optional_timestamp_arg(at: Option<DateTime<Utc>>) -> StoreResult<String> {
    at.as_ref().map(timestamp_arg).transpose().map(Option::unwrap_or_default)
}

fn encode<T: Serialize>(value: &T) -> StoreResult<String> {
    Ok(serde_json::to_string(value)?)
}

#[async_trait]
impl SchedulingStore for RedisStore {
    async fn save_doctor(&self, doctor: &Doctor) -> StoreResult<()> {
        let mut conn = self.connection().await?;
        let _: () = redis::pipe()
            .atomic()
            .set(self.doctor_key(&doctor.id), encode(doctor)?)
            .ignore()
            .sadd(self.doctors_key(), &doctor.id)
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn get_doctor(&self, doctor_id: &str) -> StoreResult<Option<Doctor>> {
        self.get_json(&self.doctor_key(doctor_id)).await
    }

    async fn list_doctors(&self) -> StoreResult<Vec<Doctor>> {
        let ids: Vec<String> = {
            let mut conn = self.connection().await?;
            conn.smembers(self.doctors_key()).await?
        };
        let keys: Vec<String> = ids.iter().map(|id| self.doctor_key(id)).collect();

        let mut doctors: Vec<Doctor> = self.mget_json(&keys).await?;
        doctors.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(doctors)
    }

    async fn insert_slots(&self, slots: &[Slot]) -> StoreResult<usize> {
        if slots.is_empty() {
            return Ok(0);
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        for slot in slots {
            pipe.cmd("SET").arg(self.slot_key(&slot.id)).arg(encode(slot)?).arg("NX");
            pipe.sadd(self.day_key(&slot.doctor_id, slot.date), &slot.id).ignore();
        }

        let mut conn = self.connection().await?;
        let results: Vec<Option<String>> = pipe.query_async(&mut conn).await?;
        let inserted = results.iter().filter(|result| result.is_some()).count();

        debug!("Inserted {} of {} slots", inserted, slots.len());
        Ok(inserted)
    }

    async fn get_slot(&self, slot_id: &str) -> StoreResult<Option<Slot>> {
        self.get_json(&self.slot_key(slot_id)).await
    }

    async fn slots_for_day(&self, doctor_id: &str, date: NaiveDate) -> StoreResult<Vec<Slot>> {
        let ids: Vec<String> = {
            let mut conn = self.connection().await?;
            conn.smembers(self.day_key(doctor_id, date)).await?
        };
        let keys: Vec<String> = ids.iter().map(|id| self.slot_key(id)).collect();
        self.mget_json(&keys).await
    }

    async fn transition_slot(
        &self,
        slot_id: &str,
        transition: &SlotTransition,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Slot>> {
        let guard = transition.guard();
        let change = transition.change();
        let key = self.slot_key(slot_id);

        let mut conn = self.connection().await?;
        let raw: Option<String> = Script::new(TRANSITION_SLOT)
            .key(&key)
            .arg(guard.status.as_str())
            .arg(guard.held_by.unwrap_or_default())
            .arg(optional_timestamp_arg(guard.held_until)?)
            .arg(change.status.as_str())
            .arg(change.held_by.unwrap_or_default())
            .arg(optional_timestamp_arg(change.held_until)?)
            .arg(timestamp_arg(&now)?)
            .invoke_async(&mut conn)
            .await?;

        if raw.is_none() {
            debug!("Slot {} guard failed for {}", slot_id, transition.name());
        }
        raw.map(|data| decode(&key, &data)).transpose()
    }

    async fn place_hold(&self, hold: &Hold, now: DateTime<Utc>) -> StoreResult<Option<Slot>> {
        let key = self.slot_key(&hold.slot_id);
        let hold_json = encode(hold)?;

        let mut conn = self.connection().await?;
        let raw: Option<String> = Script::new(PLACE_HOLD)
            .key(&key)
            .key(self.hold_key(&hold.id))
            .key(self.hold_expiry_key())
            .arg(&hold.holder_id)
            .arg(timestamp_arg(&hold.expires_at)?)
            .arg(timestamp_arg(&now)?)
            .arg(&hold_json)
            .arg(self.hold_ttl_ms)
            .arg(hold.expires_at.timestamp_millis())
            .invoke_async(&mut conn)
            .await?;

        raw.map(|data| decode(&key, &data)).transpose()
    }

    async fn get_hold(&self, hold_id: &str) -> StoreResult<Option<Hold>> {
        self.get_json(&self.hold_key(hold_id)).await
    }

    async fn delete_hold(&self, hold: &Hold) -> StoreResult<bool> {
        let mut conn = self.connection().await?;
        let (deleted, unindexed): (i64, i64) = redis::pipe()
            .atomic()
            .del(self.hold_key(&hold.id))
            .zrem(self.hold_expiry_key(), encode(hold)?)
            .query_async(&mut conn)
            .await?;

        // The record may have aged out through its TTL while the index entry
        // was still pending reclamation.
        Ok(deleted > 0 || unindexed > 0)
    }

    async fn expired_holds(&self, now: DateTime<Utc>) -> StoreResult<Vec<Hold>> {
        let key = self.hold_expiry_key();
        let mut conn = self.connection().await?;
        let members: Vec<String> = conn
            .zrangebyscore(&key, "-inf", now.timestamp_millis())
            .await?;

        // Scores are whole milliseconds; keep only holds that have truly lapsed.
        let holds = members
            .iter()
            .map(|data| decode::<Hold>(&key, data))
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(holds.into_iter().filter(|hold| hold.is_expired_at(now)).collect())
    }

    async fn upsert_patient(
        &self,
        patient_id: &str,
        details: &PatientDetails,
        now: DateTime<Utc>,
    ) -> StoreResult<Patient> {
        let key = self.patient_key(patient_id);
        let fresh = encode(&Patient::new(patient_id, details, now))?;

        let mut conn = self.connection().await?;
        let raw: String = Script::new(UPSERT_PATIENT)
            .key(&key)
            .arg(fresh)
            .arg(&details.name)
            .arg(&details.email)
            .arg(&details.phone)
            .arg(timestamp_arg(&now)?)
            .invoke_async(&mut conn)
            .await?;

        decode(&key, &raw)
    }

    async fn get_patient(&self, patient_id: &str) -> StoreResult<Option<Patient>> {
        self.get_json(&self.patient_key(patient_id)).await
    }

    async fn insert_appointment(&self, appointment: &Appointment) -> StoreResult<()> {
        let mut conn = self.connection().await?;
        let _: () = redis::pipe()
            .atomic()
            .set(self.appointment_key(&appointment.id), encode(appointment)?)
            .ignore()
            .sadd(self.patient_appointments_key(&appointment.patient_id), &appointment.id)
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn get_appointment(&self, appointment_id: &str) -> StoreResult<Option<Appointment>> {
        self.get_json(&self.appointment_key(appointment_id)).await
    }

    async fn appointments_for_patient(&self, patient_id: &str) -> StoreResult<Vec<Appointment>> {
        let ids: Vec<String> = {
            let mut conn = self.connection().await?;
            conn.smembers(self.patient_appointments_key(patient_id)).await?
        };
        let keys: Vec<String> = ids.iter().map(|id| self.appointment_key(id)).collect();
        self.mget_json(&keys).await
    }

    async fn transition_appointment(
        &self,
        appointment_id: &str,
        from: AppointmentStatus,
        to: AppointmentStatus,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Appointment>> {
        let key = self.appointment_key(appointment_id);
        let mut conn = self.connection().await?;
        let raw: Option<String> = Script::new(TRANSITION_APPOINTMENT)
            .key(&key)
            .arg(from.as_str())
            .arg(to.as_str())
            .arg(timestamp_arg(&now)?)
            .invoke_async(&mut conn)
            .await?;

        raw.map(|data| decode(&key, &data)).transpose()
    }

    async fn set_calendar_event(
        &self,
        appointment_id: &str,
        event_id: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Appointment>> {
        let key = self.appointment_key(appointment_id);
        let mut conn = self.connection().await?;
        let raw: Option<String> = Script::new(SET_CALENDAR_EVENT)
            .key(&key)
            .arg(event_id)
            .arg(timestamp_arg(&now)?)
            .invoke_async(&mut conn)
            .await?;

        raw.map(|data| decode(&key, &data)).transpose()
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
