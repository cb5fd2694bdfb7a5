use std::sync::Arc;
use serde_json::{json, Value};

use shared_config::AppConfig;

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_service_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_service_key: "test-service-key".to_string(),
        }
    }
}

impl TestConfig {
    /// Config pointed at a wiremock server standing in for PostgREST.
    pub fn for_mock_server(uri: &str) -> Self {
        Self {
            supabase_url: uri.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_service_key: self.supabase_service_key.clone(),
            port: 3000,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

/// Canned PostgREST rows for appointment tests.
pub struct MockStoreResponses;

impl MockStoreResponses {
    pub fn appointment_row(
        tenant_id: &str,
        appointment_id: &str,
        user_id: &str,
        doctor_id: &str,
        start_iso: &str,
        end_iso: &str,
        status: &str,
    ) -> Value {
        let start: chrono::DateTime<chrono::Utc> = start_iso.parse().expect("valid start_iso");
        let day = start.format("%Y%m%d");
        let hhmm = start.format("%H%M");
        json!({
            "appointment_id": appointment_id,
            "tenant_id": tenant_id,
            "user_id": user_id,
            "patient_name": "Test Patient",
            "patient_phone": null,
            "patient_email": null,
            "doctor_id": doctor_id,
            "doctor_name": "Dr. Test",
            "start_iso": start_iso,
            "end_iso": end_iso,
            "duration_minutes": 30,
            "status": status,
            "source": "whatsapp",
            "notes": null,
            "calendar_event_id": null,
            "calendar_sync_status": "pending",
            "created_at": "2025-01-01T00:00:00Z",
            "updated_at": "2025-01-01T00:00:00Z",
            "start_key": format!("START#{}#{}", day, hhmm),
            "user_key": format!("{}#USER#{}", tenant_id, user_id),
            "doctor_key": format!("{}#DOCTOR#{}", tenant_id, doctor_id),
            "status_key": format!("{}#STATUS#{}", tenant_id, status),
        })
    }
}
