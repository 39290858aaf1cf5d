//! Request handler definitions
//!
//! Define each route and its handler here. Handlers that are more than a line or two go into a separate module (the
//! webhook's lives in [`crate::jsonrpc`]).
//!
//! Each worker thread processes its requests sequentially, so a handler must never block the thread. Database access
//! and other I/O is expressed as futures, which lets the worker serve other requests while a handler awaits:
//!
//! ```nocompile
//!     async fn my_handler() -> impl Responder {
//!         tokio::time::sleep(Duration::from_secs(5)).await; // <-- Ok. Worker thread will handle other requests here
//!     }
//! ```
use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use fine_payment_engine::{TransactionFlowApi, TransactionStore};
use log::*;

use crate::jsonrpc::handle_rpc_body;

/// Declares a route struct for a handler that is generic over its storage backend, so that the server can mount it for
/// the real database and the tests can mount it for anything else.
///
/// `route!(name => Method "/path" impl Trait)` creates `NameRoute<T>`, which registers `name::<T>` for `Method` requests
/// to `/path`.
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

// ----------------------------------------------   Payme  ----------------------------------------------------
route!(payme_webhook => Post "" impl TransactionStore);
/// The merchant webhook. Mounted under the `/payme` scope, behind the gateway authorization middleware.
///
/// The body is taken as raw bytes so that a body that is not JSON still gets a JSON-RPC parse error back. The answer is
/// always HTTP 200.
pub async fn payme_webhook<B: TransactionStore>(
    body: web::Bytes,
    api: web::Data<TransactionFlowApi<B>>,
) -> HttpResponse {
    let now = Utc::now();
    trace!("💻️ Received gateway call ({} bytes)", body.len());
    let response = handle_rpc_body(api.as_ref(), &body, now).await;
    HttpResponse::Ok().json(response)
}
