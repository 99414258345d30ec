//! tests/agent_tests.rs

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use actix_rt::test;
    use actix_web::http::StatusCode;
    use actix_web::test::{call_service, init_service, read_body, TestRequest};
    use actix_web::{web, App};
    use serde_json::Value;

    use crate::app::init_app;
    use crate::services::agent_config_service::AgentConfigService;
    use crate::tests::support::start_upstream;

    #[test]
    async fn test_agent_config_is_cached() {
        let (upstream, seen) = start_upstream();
        let service = AgentConfigService::new(upstream, Duration::from_secs(300));

        let first = service.get_agent_config("harvey-1").await.unwrap();
        let second = service.get_agent_config("harvey-1").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first["agentId"], "harvey-1");
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    async fn test_agent_config_endpoint_statuses() {
        let (upstream, seen) = start_upstream();
        let service = AgentConfigService::new(upstream, Duration::from_secs(300));
        let app = init_service(
            App::new()
                .app_data(web::Data::new(service))
                .configure(init_app),
        )
        .await;

        let resp = call_service(
            &app,
            TestRequest::get().uri("/api/agents/coach_7/config").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = serde_json::from_slice(&read_body(resp).await).unwrap();
        assert_eq!(body["voice"], "alice");

        // El 404 del backend se propaga y no se cachea
        for _ in 0..2 {
            let resp = call_service(
                &app,
                TestRequest::get().uri("/api/agents/missing/config").to_request(),
            )
            .await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        }
        assert_eq!(seen.lock().unwrap().len(), 3);

        let resp = call_service(
            &app,
            TestRequest::get().uri("/api/agents/bad%20id/config").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
