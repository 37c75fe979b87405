use std::sync::Arc;

use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;

use crate::codec::ApiResponse;
use crate::routing::{handler, MethodMap, RouteMap};
use crate::services::SystemService;

pub fn route_map(service: SystemService) -> RouteMap {
    let service = Arc::new(service);

    let status = {
        let service = Arc::clone(&service);
        handler(move |_req| {
            let status = service.get_status();
            async move { ApiResponse::ok(StatusCode::OK, status).into_response() }
        })
    };

    let driver = handler(move |_req| {
        let service = Arc::clone(&service);
        async move {
            let info = service.get_driver_info().await;
            ApiResponse::ok(StatusCode::OK, info).into_response()
        }
    });

    RouteMap::new()
        .route(
            "^/api/system/status$",
            MethodMap::new().on(Method::GET, status),
        )
        .route(
            "^/api/system/driver$",
            MethodMap::new().on(Method::GET, driver),
        )
}
