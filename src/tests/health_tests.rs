//! tests/health_tests.rs
//! Agregado de salud, endpoint /health y monitor de polling.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use actix_web::http::StatusCode;
    use actix_web::test::{call_service, init_service, read_body, TestRequest};
    use actix_web::{web, App};
    use serde_json::Value;

    use crate::app::init_app;
    use crate::config::app_config::{HealthConfig, ServiceRegistry};
    use crate::models::health_model::{HealthReport, HealthSnapshot, HealthState};
    use crate::services::health_monitor::HealthMonitor;
    use crate::services::health_service::HealthService;
    use crate::tests::support::{closed_port_url, memory_pool, start_upstream};

    use HealthState::*;

    #[test]
    fn test_aggregate_rules() {
        assert_eq!(HealthState::aggregate([Healthy, Healthy]), Healthy);
        assert_eq!(HealthState::aggregate([Healthy, Unknown]), Healthy);
        assert_eq!(HealthState::aggregate([Healthy, Degraded]), Degraded);
        assert_eq!(HealthState::aggregate([Healthy, Unhealthy]), Degraded);
        assert_eq!(HealthState::aggregate([Unhealthy, Unknown]), Unhealthy);
        assert_eq!(HealthState::aggregate([Unknown, Unknown]), Unknown);
        assert_eq!(HealthState::aggregate(Vec::<HealthState>::new()), Unknown);
    }

    #[test]
    fn test_report_parsing_and_indicator() {
        let raw = r#"{
            "status": "degraded",
            "checks": {
                "twilio": { "status": "healthy", "responseTime": 87 },
                "deepgram": { "status": "offline", "message": "quota" },
                "database": { "status": "unhealthy", "message": "timeout" }
            }
        }"#;
        let report: HealthReport = serde_json::from_str(raw).unwrap();
        assert_eq!(report.checks["deepgram"].status, Unknown);

        let snapshot = HealthSnapshot::from_report(report);
        let names: Vec<&str> = snapshot.services.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["database", "deepgram", "twilio"]);

        let indicator = snapshot.indicator();
        assert_eq!(indicator.color, "yellow");
        assert_eq!(indicator.icon, "alert-triangle");
        assert_eq!(indicator.status, "degraded");
        assert_eq!(
            indicator.detail,
            vec![
                "database: unhealthy - timeout",
                "deepgram: unknown - quota",
                "twilio: healthy (87ms)",
            ]
        );
    }

    #[test]
    fn test_report_accepts_float_times_and_epoch_timestamps() {
        let raw = r#"{
            "status": "healthy",
            "timestamp": 1704067200000,
            "checks": { "openai": { "status": "healthy", "responseTime": 12.5 } }
        }"#;
        let report: HealthReport = serde_json::from_str(raw).unwrap();
        assert_eq!(report.checks["openai"].response_time, Some(13));
        assert_eq!(
            report.timestamp.map(|t| t.to_rfc3339()),
            Some("2024-01-01T00:00:00+00:00".to_string())
        );

        let raw = r#"{
            "status": "healthy",
            "timestamp": "2024-01-01T00:00:00.000Z",
            "checks": { "db": { "status": "healthy", "responseTime": null } }
        }"#;
        let report: HealthReport = serde_json::from_str(raw).unwrap();
        assert!(report.timestamp.is_some());
        assert_eq!(report.checks["db"].response_time, None);

        let raw = r#"{ "status": "healthy", "timestamp": true }"#;
        let report: HealthReport = serde_json::from_str(raw).unwrap();
        assert!(report.timestamp.is_none());
    }

    #[test]
    fn test_failed_poll_renders_error_state() {
        let indicator = HealthSnapshot::failed("connection refused").indicator();
        assert_eq!(indicator.color, "gray");
        assert_eq!(indicator.status, "error");
        assert_eq!(indicator.detail, vec!["error: connection refused"]);
    }

    #[actix_rt::test]
    async fn test_health_endpoint_reports_each_dependency() {
        let pool = memory_pool(false).await;
        let registry = ServiceRegistry::default()
            .with_service(ServiceRegistry::OPENAI, None, Some("sk-test".to_string()))
            .with_service(ServiceRegistry::DEEPGRAM, None, None)
            .with_service(ServiceRegistry::BACKEND, Some(closed_port_url()), None);

        let app = init_service(
            App::new()
                .app_data(web::Data::new(HealthService::new(Some(pool), registry)))
                .configure(init_app),
        )
        .await;

        let resp = call_service(&app, TestRequest::get().uri("/health").to_request()).await;
        // database ok + backend caído = degraded, sigue siendo 200
        assert_eq!(resp.status(), StatusCode::OK);

        let body: Value = serde_json::from_slice(&read_body(resp).await).unwrap();
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["checks"]["database"]["status"], "healthy");
        assert!(body["checks"]["database"]["responseTime"].is_u64());
        assert_eq!(body["checks"]["backend"]["status"], "unhealthy");
        assert_eq!(body["checks"]["openai"]["status"], "healthy");
        assert_eq!(body["checks"]["deepgram"]["status"], "unknown");
        assert_eq!(body["checks"]["deepgram"]["message"], "not configured");
    }

    #[actix_rt::test]
    async fn test_health_endpoint_is_503_when_everything_is_down() {
        let registry =
            ServiceRegistry::default().with_service(ServiceRegistry::BACKEND, Some(closed_port_url()), None);
        let app = init_service(
            App::new()
                .app_data(web::Data::new(HealthService::new(None, registry)))
                .configure(init_app),
        )
        .await;

        let resp = call_service(&app, TestRequest::get().uri("/health").to_request()).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[actix_rt::test]
    async fn test_monitor_keeps_latest_snapshot() {
        let (upstream, seen) = start_upstream();
        let monitor = HealthMonitor::new(HealthConfig {
            poll_url: format!("{}/health", upstream),
            poll_interval: Duration::from_secs(30),
        });
        assert!(monitor.latest().checked_at.is_none());

        let snapshot = monitor.poll_once().await;
        assert!(snapshot.error.is_none());
        assert_eq!(snapshot.overall, Degraded);
        assert_eq!(snapshot.services.len(), 2);
        // El upstream manda 120.4
        assert_eq!(monitor.latest().services[1].response_time, Some(120));
        assert_eq!(seen.lock().unwrap().len(), 1);

        let app = init_service(
            App::new()
                .app_data(web::Data::new(monitor.clone()))
                .configure(init_app),
        )
        .await;
        let resp = call_service(
            &app,
            TestRequest::get().uri("/api/health/indicator").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(&read_body(resp).await).unwrap();
        assert_eq!(body["color"], "yellow");
        assert_eq!(body["detail"][0], "database: unhealthy - timeout");
    }

    #[actix_rt::test]
    async fn test_monitor_error_state_until_next_poll() {
        let monitor = HealthMonitor::new(HealthConfig {
            poll_url: format!("{}/health", closed_port_url()),
            poll_interval: Duration::from_secs(30),
        });

        let snapshot = monitor.poll_once().await;
        assert_eq!(snapshot.overall, Unknown);
        assert!(snapshot.error.is_some());
        assert_eq!(monitor.indicator().status, "error");
    }
}
