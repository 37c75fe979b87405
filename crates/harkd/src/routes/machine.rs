use std::future::Future;
use std::sync::Arc;

use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use hark_core::Machine;

use super::MACHINE_ID_PARAM;
use crate::codec::{self, ApiResponse};
use crate::routing::{handler, Handler, MethodMap, RouteMap, RouteRequest};
use crate::services::MachineService;

pub fn route_map(service: MachineService) -> RouteMap {
    let service = Arc::new(service);

    RouteMap::new()
        .route(
            "^/api/machine$",
            MethodMap::new()
                .on(Method::GET, bind(&service, get_machines))
                .on(Method::PUT, bind(&service, create_machine)),
        )
        .route(
            format!(r"^/api/machine/(?P<{}>\w+)$", MACHINE_ID_PARAM),
            MethodMap::new().on(Method::GET, bind(&service, get_machine_by_id)),
        )
}

fn bind<F, Fut>(service: &Arc<MachineService>, f: F) -> Handler
where
    F: Fn(Arc<MachineService>, RouteRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    let service = Arc::clone(service);
    handler(move |req| f(Arc::clone(&service), req))
}

async fn get_machines(service: Arc<MachineService>, _req: RouteRequest) -> Response {
    ApiResponse::from_result(StatusCode::OK, service.get_machines().await).into_response()
}

async fn create_machine(service: Arc<MachineService>, req: RouteRequest) -> Response {
    let machine: Machine = match codec::decode(&req.body) {
        Ok(machine) => machine,
        Err(err) => return ApiResponse::error(&err).into_response(),
    };

    match service.create_machine(machine).await {
        Ok(()) => ApiResponse::empty(StatusCode::CREATED).into_response(),
        Err(err) => ApiResponse::error(&err).into_response(),
    }
}

async fn get_machine_by_id(service: Arc<MachineService>, req: RouteRequest) -> Response {
    let machine_id = req.param(MACHINE_ID_PARAM).unwrap_or_default();
    ApiResponse::from_result(StatusCode::OK, service.get_machine_by_id(machine_id).await)
        .into_response()
}
