mod auth;
mod bookings;
mod extract;
mod hotels;
mod rooms;
mod tax;
mod users;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

use crate::auth::middleware::{require_admin, require_auth};
use crate::auth::TokenService;
use crate::config::Config;
use crate::db::DbPool;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub tokens: TokenService,
}

async fn health() -> &'static str {
    "ok"
}

/// Per-IP limit of `burst` requests, refilled one every `per_second` seconds.
fn rate_limited(
    router: Router<AppState>,
    enabled: bool,
    per_second: u64,
    burst: u32,
) -> Router<AppState> {
    if !enabled {
        return router;
    }
    match GovernorConfigBuilder::default()
        .per_second(per_second)
        .burst_size(burst)
        .finish()
    {
        Some(config) => router.layer(GovernorLayer::new(Arc::new(config))),
        None => {
            tracing::warn!(per_second, burst, "Invalid rate limit settings, not limiting");
            router
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let limit = state.config.rate_limit;

    // Health checks: no rate limit
    let health_routes = Router::new().route("/health", get(health));

    // Auth routes: strict rate limit
    let auth_routes = rate_limited(
        Router::new()
            .route("/auth/signup", post(auth::signup))
            .route("/auth/login", post(auth::login))
            .route("/auth/logout", post(auth::logout)),
        limit,
        6,
        10,
    );

    // Catalog browsing and reviews: open to everyone
    let public = rate_limited(
        Router::new()
            .route("/admin/hotel/all-hotels", get(hotels::list))
            .route("/admin/hotel/searchByName", get(hotels::search_by_name))
            .route("/admin/hotel/searchByCountry", get(hotels::search_by_country))
            .route("/admin/hotel/searchByCity", get(hotels::search_by_city))
            .route("/admin/hotel/searchByProvince", get(hotels::search_by_province))
            .route("/admin/hotel/{id}/reviews", post(hotels::add_review))
            .route("/admin/room/allRooms", get(rooms::list))
            .route("/admin/room/searchRoomByName", get(rooms::search_by_name))
            .route("/admin/room/searchRoomByPrice", get(rooms::search_by_price))
            .route("/admin/room/searchRoomByAmenities", get(rooms::search_by_amenities))
            .route("/admin/room/searchRoomByBedType", get(rooms::search_by_bed_type))
            .route("/admin/room/byHotel/{id}", get(rooms::by_hotel))
            .route("/admin/room/{id}", get(rooms::get)),
        limit,
        2,
        30,
    );

    // Any signed-in user
    let authenticated = Router::new()
        .route("/admin/hotel/{id}", get(hotels::get))
        .route("/booking/allBookings", get(bookings::list))
        .route("/booking/newBooking", post(bookings::create))
        .route("/booking/user/{id}", get(bookings::list_for_user))
        .route("/booking/updateBooking/{id}", patch(bookings::update))
        .route("/booking/cancelBooking/{id}", delete(bookings::cancel))
        .route("/booking/{id}", get(bookings::get))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // Admins only
    let admin = Router::new()
        .route("/admin/allUsers", get(users::list))
        .route(
            "/admin/{id}",
            get(users::get).put(users::update).delete(users::delete),
        )
        .route("/admin/hotel/newHotel", post(hotels::create))
        .route(
            "/admin/hotel/{id}",
            patch(hotels::update).delete(hotels::delete),
        )
        .route("/admin/room/newRoom", post(rooms::create))
        .route(
            "/admin/room/{id}",
            patch(rooms::update).delete(rooms::delete),
        )
        .route("/admin/tax/all", get(tax::list))
        .route("/admin/tax", put(tax::upsert))
        .route("/admin/tax/{id}", delete(tax::delete))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let protected = rate_limited(authenticated.merge(admin), limit, 2, 120);

    Router::new()
        .merge(health_routes)
        .merge(auth_routes)
        .merge(public)
        .merge(protected)
        .with_state(state)
}
