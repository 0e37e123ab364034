use std::{convert::Infallible, net::SocketAddr};

use tracing::{error, info};
use warp::{http::StatusCode, Filter, Rejection, Reply};

use crate::{query::VehicleFilters, store::Inventory};

pub fn routes(
    inventory: Inventory,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::post()
        .and(warp::path!("mcp" / "buscar_veiculos"))
        .and(warp::body::json::<VehicleFilters>())
        .and(warp::any().map(move || inventory.clone()))
        .and_then(search)
}

async fn search(filters: VehicleFilters, inventory: Inventory) -> Result<impl Reply, Infallible> {
    info!("Search request: {filters:?}");
    match inventory.search(&filters) {
        Ok(vehicles) => {
            info!("Returning {} vehicles", vehicles.len());
            Ok(warp::reply::with_status(
                warp::reply::json(&vehicles),
                StatusCode::OK,
            ))
        }
        Err(e) => {
            error!("Inventory search failed: {e:#}");
            Ok(warp::reply::with_status(
                warp::reply::json(&serde_json::json!({ "detail": e.to_string() })),
                StatusCode::INTERNAL_SERVER_ERROR,
            ))
        }
    }
}

pub async fn serve(inventory: Inventory, addr: SocketAddr) {
    info!("Inventory service listening on {addr}");
    warp::serve(routes(inventory)).run(addr).await;
}
