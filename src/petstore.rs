//! Pet-store route table used by the command-line tool.
//!
//! Covers the usual pets, store and users endpoints, links between them, OAuth2 and API
//! key security and a separate `admin` specification.

use crate::document::Server;
use crate::links::{Link, LinkKey, LinkLocation, ResponseLocation};
use crate::projection::{content_type, OpenApiValue};
use crate::route::RouteTable;
use crate::security::{ApiKeyLocation, AuthScheme, OAuthFlow, OAuthFlows, SecurityScheme};
use crate::type_descriptor::{ApiType, Binary, TypeDescriptor, WithExample};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

pub const ADMIN_SPEC: &str = "admin";

#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

impl ApiType for Category {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::object::<Category>("Category")
            .field::<i64>("id")
            .field::<String>("name")
    }
}

impl WithExample for Category {
    fn example() -> Self {
        Category {
            id: 1,
            name: "Dogs".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

impl ApiType for Tag {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::object::<Tag>("Tag")
            .field::<i64>("id")
            .field::<String>("name")
    }
}

impl WithExample for Tag {
    fn example() -> Self {
        Tag {
            id: 1,
            name: "friendly".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PetStatus {
    Available,
    Pending,
    Sold,
}

impl ApiType for PetStatus {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::string_enum::<PetStatus>("PetStatus", &["available", "pending", "sold"])
            .description("pet status in the store")
    }
}

impl WithExample for PetStatus {
    fn example() -> Self {
        PetStatus::Available
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    pub id: i64,
    pub name: String,
    pub category: Option<Category>,
    pub photo_urls: Vec<String>,
    pub tags: Vec<Tag>,
    pub status: Option<PetStatus>,
}

impl ApiType for Pet {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::object::<Pet>("Pet")
            .field::<i64>("id")
            .field::<String>("name")
            .field::<Option<Category>>("category")
            .field::<Vec<String>>("photoUrls")
            .field::<Vec<Tag>>("tags")
            .field::<Option<PetStatus>>("status")
    }
}

impl WithExample for Pet {
    fn example() -> Self {
        Pet {
            id: 10,
            name: "doggie".to_string(),
            category: Some(Category::example()),
            photo_urls: vec!["https://example.com/doggie.png".to_string()],
            tags: vec![Tag::example()],
            status: Some(PetStatus::Available),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Placed,
    Approved,
    Delivered,
}

impl ApiType for OrderStatus {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::string_enum::<OrderStatus>("OrderStatus", &["placed", "approved", "delivered"])
            .description("Order Status")
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub pet_id: i64,
    pub quantity: i32,
    pub ship_date: Option<DateTime<Utc>>,
    pub status: OrderStatus,
    pub complete: bool,
}

impl ApiType for Order {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::object::<Order>("Order")
            .field::<i64>("id")
            .field::<i64>("petId")
            .field::<i32>("quantity")
            .field::<Option<DateTime<Utc>>>("shipDate")
            .field::<OrderStatus>("status")
            .field::<bool>("complete")
    }
}

impl WithExample for Order {
    fn example() -> Self {
        Order {
            id: 10,
            pet_id: 198772,
            quantity: 7,
            ship_date: None,
            status: OrderStatus::Approved,
            complete: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub user_status: i32,
}

impl ApiType for User {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::object::<User>("User")
            .field::<i64>("id")
            .field::<String>("username")
            .field::<String>("firstName")
            .field::<String>("lastName")
            .field::<String>("email")
            .field::<String>("password")
            .field::<String>("phone")
            .described_field::<i32>("userStatus", "User Status")
    }
}

impl WithExample for User {
    fn example() -> Self {
        User {
            id: 10,
            username: "theUser".to_string(),
            first_name: "John".to_string(),
            last_name: "James".to_string(),
            email: "john@email.com".to_string(),
            password: "12345".to_string(),
            phone: "12345".to_string(),
            user_status: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse {
    pub code: i32,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}

impl ApiType for ApiResponse {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::object::<ApiResponse>("ApiResponse")
            .field::<i32>("code")
            .field::<String>("type")
            .field::<String>("message")
    }
}

impl WithExample for ApiResponse {
    fn example() -> Self {
        ApiResponse {
            code: 404,
            kind: "error".to_string(),
            message: "Pet not found".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusQuery {
    pub status: PetStatus,
}

impl ApiType for StatusQuery {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::object::<StatusQuery>("StatusQuery")
            .described_field::<PetStatus>("status", "Status values that need to be considered for filter")
    }
}

impl WithExample for StatusQuery {
    fn example() -> Self {
        StatusQuery {
            status: PetStatus::Available,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TagsQuery {
    pub tags: Vec<String>,
}

impl ApiType for TagsQuery {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::object::<TagsQuery>("TagsQuery")
            .described_field::<Vec<String>>("tags", "Tags to filter by")
    }
}

impl WithExample for TagsQuery {
    fn example() -> Self {
        TagsQuery {
            tags: vec!["friendly".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginQuery {
    pub username: String,
    pub password: String,
}

impl ApiType for LoginQuery {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::object::<LoginQuery>("LoginQuery")
            .described_field::<String>("username", "The user name for login")
            .described_field::<String>("password", "The password for login in clear text")
    }
}

impl WithExample for LoginQuery {
    fn example() -> Self {
        LoginQuery {
            username: "theUser".to_string(),
            password: "12345".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RateLimitHeaders {
    #[serde(rename = "X-Rate-Limit")]
    pub rate_limit: i32,
    #[serde(rename = "X-Expires-After")]
    pub expires_after: DateTime<Utc>,
}

impl ApiType for RateLimitHeaders {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::object::<RateLimitHeaders>("RateLimitHeaders")
            .described_field::<i32>("X-Rate-Limit", "calls per hour allowed by the user")
            .described_field::<DateTime<Utc>>("X-Expires-After", "date in UTC when token expires")
    }
}

impl WithExample for RateLimitHeaders {
    fn example() -> Self {
        RateLimitHeaders {
            rate_limit: 100,
            expires_after: DateTime::<Utc>::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiKeyHeader {
    pub api_key: Option<String>,
}

impl ApiType for ApiKeyHeader {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::object::<ApiKeyHeader>("ApiKeyHeader").field::<Option<String>>("api_key")
    }
}

impl WithExample for ApiKeyHeader {
    fn example() -> Self {
        ApiKeyHeader {
            api_key: Some("special-key".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub inventory: HashMap<String, i32>,
    pub orders: u64,
}

impl ApiType for StoreStats {
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor::object::<StoreStats>("StoreStats")
            .field::<HashMap<String, i32>>("inventory")
            .field::<u64>("orders")
    }
}

impl WithExample for StoreStats {
    fn example() -> Self {
        StoreStats {
            inventory: HashMap::from([("available".to_string(), 12)]),
            orders: 42,
        }
    }
}

/// Identifier of a pet, returned by `POST /pet` and consumed by the `/pet/{petId}` routes
pub struct PetId;

impl LinkKey for PetId {
    fn description() -> Option<String> {
        Some("The `id` of the created pet can be used as `petId`".to_string())
    }
}

pub struct OrderId;
impl LinkKey for OrderId {}

pub struct Username;
impl LinkKey for Username {}

pub fn petstore_auth() -> AuthScheme {
    AuthScheme::named(
        "petstore_auth",
        SecurityScheme::oauth2(OAuthFlows {
            implicit: Some(
                OAuthFlow::new([
                    ("write:pets", "modify pets in your account"),
                    ("read:pets", "read your pets"),
                ])
                .authorization_url("https://petstore3.swagger.io/oauth/authorize"),
            ),
            ..OAuthFlows::default()
        }),
    )
}

pub fn api_key_auth() -> AuthScheme {
    AuthScheme::named("api_key", SecurityScheme::api_key("api_key", ApiKeyLocation::Header))
}

/// Builds the route table of the pet store
pub fn routes() -> RouteTable {
    let mut routes = RouteTable::new();
    pet_routes(&mut routes);
    store_routes(&mut routes);
    user_routes(&mut routes);
    admin_routes(&mut routes);
    routes
}

fn pet_routes(routes: &mut RouteTable) {
    let mut pets = routes.grouped("pet", |op| {
        op.tags(["pet"])
            .auth(petstore_auth())
            .error(400, OpenApiValue::example::<ApiResponse>())
            .error_description(400, "Invalid input");
    });

    pets.post("", |op| {
        op.summary("Add a new pet to the store")
            .operation_id("addPet")
            .body(OpenApiValue::example::<Pet>())
            .body_description("Create a new pet in the store")
            .body_content_types([content_type::JSON, content_type::FORM])
            .response(OpenApiValue::example::<Pet>())
            .response_description("Successful operation")
            .link::<PetId>(Link::detect(
                |pet: &mut Pet| &mut pet.id,
                LinkLocation::Response(ResponseLocation::Body),
            ));
    });
    pets.put("", |op| {
        op.summary("Update an existing pet")
            .operation_id("updatePet")
            .body(OpenApiValue::example::<Pet>())
            .response(OpenApiValue::example::<Pet>())
            .error_description(404, "Pet not found");
    });
    pets.get("findByStatus", |op| {
        op.summary("Finds Pets by status")
            .description("Multiple status values can be provided with comma separated strings")
            .query(OpenApiValue::example::<StatusQuery>())
            .response(OpenApiValue::example::<Vec<Pet>>());
    });
    pets.get("findByTags", |op| {
        op.summary("Finds Pets by tags")
            .query(OpenApiValue::example::<TagsQuery>())
            .response(OpenApiValue::example::<Vec<Pet>>())
            .deprecated(true);
    });
    pets.get(":petId", |op| {
        op.summary("Find pet by ID")
            .response(OpenApiValue::example::<Pet>())
            .auth(api_key_auth())
            .error_description(404, "Pet not found")
            .link::<PetId>(Link::path("petId"));
    });
    pets.delete(":petId", |op| {
        op.summary("Deletes a pet")
            .headers(OpenApiValue::example::<ApiKeyHeader>())
            .link::<PetId>(Link::path("petId"));
    });
    pets.post(":petId/uploadImage", |op| {
        op.summary("uploads an image")
            .body(OpenApiValue::example::<Binary>())
            .response(OpenApiValue::example::<ApiResponse>())
            .extension("x-codegen-request-body-name", "body");
    });
}

fn store_routes(routes: &mut RouteTable) {
    let mut store = routes.grouped("store", |op| {
        op.tags(["store"]);
    });

    store.get("inventory", |op| {
        op.summary("Returns pet inventories by status")
            .response(OpenApiValue::example::<HashMap<String, i32>>())
            .auth(api_key_auth());
    });
    store.post("order", |op| {
        op.summary("Place an order for a pet")
            .body(OpenApiValue::example::<Order>())
            .response(OpenApiValue::example::<Order>())
            .link::<OrderId>(Link::response_body("id"));
    });
    store.get("order/:orderId", |op| {
        op.summary("Find purchase order by ID")
            .response(OpenApiValue::example::<Order>())
            .error_description(404, "Order not found")
            .link::<OrderId>(Link::path("orderId"));
    });
    store.delete("order/:orderId", |op| {
        op.summary("Delete purchase order by ID")
            .error_description(404, "Order not found")
            .link::<OrderId>(Link::path("orderId"));
    });
}

fn user_routes(routes: &mut RouteTable) {
    let mut users = routes.grouped("user", |op| {
        op.tags(["user"]);
    });

    users.post("", |op| {
        op.summary("Create user")
            .description("This can only be done by the logged in user.")
            .body(OpenApiValue::example::<User>())
            .response(OpenApiValue::example::<User>())
            .link::<Username>(Link::response_body("username"));
    });
    users.post("createWithList", |op| {
        op.summary("Creates list of users with given input array")
            .body(OpenApiValue::example::<Vec<User>>())
            .response(OpenApiValue::example::<User>());
    });
    users.get("login", |op| {
        op.summary("Logs user into the system")
            .query(OpenApiValue::example::<LoginQuery>())
            .response(OpenApiValue::example::<String>())
            .response_headers(OpenApiValue::example::<RateLimitHeaders>())
            .error_description(400, "Invalid username/password supplied");
    });
    users.get("logout", |op| {
        op.summary("Logs out current logged in user session");
    });
    users.get(":username", |op| {
        op.summary("Get user by user name")
            .response(OpenApiValue::example::<User>())
            .error_description(404, "User not found")
            .link::<Username>(Link::path("username"));
    });
    users.put(":username", |op| {
        op.summary("Update user")
            .body(OpenApiValue::example::<User>())
            .link::<Username>(Link::path("username"));
    });
    users.delete(":username", |op| {
        op.summary("Delete user")
            .error_description(404, "User not found")
            .link::<Username>(Link::path("username"));
    });
}

fn admin_routes(routes: &mut RouteTable) {
    let mut admin = routes.grouped("admin", |op| {
        op.spec(ADMIN_SPEC)
            .tags(["admin"])
            .auth(api_key_auth())
            .server(Server::new("https://admin.petstore.example.com"));
    });

    admin.get("stats", |op| {
        op.summary("Store statistics")
            .response(OpenApiValue::example::<StoreStats>());
    });
    admin.delete("cache", |op| {
        op.summary("Drops cached inventory").response_status(204);
    });
    admin.get("health", |op| {
        op.summary("Liveness probe").exclude();
    });
}
