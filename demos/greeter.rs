//! Greeter - invoking controller actions end to end.
//!
//! This example demonstrates:
//! - Registering fixed-arity, variadic and connection actions
//! - Binding arguments from a query string and a JSON body
//! - Running a filter chain that ends in the action invoker
//! - Rendering the captured response into a reply
//!
//! ```text
//! cargo run --example greeter
//! ```

use std::sync::Arc;

use actionwire::{
    run_filters, ActionInvoker, ActionTable, BinderConfig, Body, ConnectionHandle, Controller,
    Filter, FilterChain, HandlerContext, LiveConnection, Params, PlainText, RenderJson, Reply,
    Request, Result,
};
use serde::Serialize;
use tokio::io::duplex;

#[derive(Default)]
struct Greeter {
    log: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Greeting {
    text: String,
    times: i64,
}

impl Greeter {
    fn greet(&mut self, name: String, times: i64) -> RenderJson<Greeting> {
        RenderJson(Greeting {
            text: format!("Hello, {}!", name),
            times,
        })
    }

    fn stream(&mut self, conn: LiveConnection) -> PlainText {
        match conn.handle() {
            Some(handle) => PlainText::new(format!("streaming on connection {}", handle.id())),
            None => PlainText::new("no connection"),
        }
    }

    fn log_all(&mut self, tags: Vec<String>) {
        self.log.extend(tags);
    }
}

impl Controller for Greeter {
    fn register_actions(actions: &mut ActionTable<Self>) -> Result<()> {
        actions.register("greet", &["name", "times"], Greeter::greet)?;
        actions.register("stream", &["conn"], Greeter::stream)?;
        actions.register_variadic("log_all", &["tags"], Greeter::log_all)?;
        Ok(())
    }
}

/// Logs the action about to run, then continues.
fn announce(ctx: &mut HandlerContext<Greeter>, chain: FilterChain<'_, Greeter>) -> Result<()> {
    println!("-> {}", ctx.method());
    chain.next(ctx)
}

fn render(ctx: &mut HandlerContext<Greeter>) -> Result<Option<Reply>> {
    let Some(response) = ctx.take_result() else {
        return Ok(None);
    };
    let mut reply = Reply::new();
    response.apply(&mut reply)?;
    Ok(Some(reply))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let actions = Arc::new(ActionTable::<Greeter>::for_controller()?);
    let filters: Vec<Arc<dyn Filter<Greeter>>> = vec![Arc::new(announce), Arc::new(ActionInvoker)];

    // greet?name=Ada&times=3
    let params = Params::new().with_query_string("name=Ada&times=3")?;
    let mut ctx = HandlerContext::for_action(Greeter::default(), actions.clone(), "greet")?
        .with_params(params, BinderConfig::default());
    run_filters(&filters, &mut ctx)?;
    if let Some(reply) = render(&mut ctx)? {
        println!("{} {}", reply.status(), String::from_utf8_lossy(reply.body()));
    }

    // stream, with a live connection attached to the request
    let (stream, _peer) = duplex(64);
    let request = Request::new("/greeter/stream").with_connection(ConnectionHandle::new(stream));
    let mut ctx = HandlerContext::for_action(Greeter::default(), actions.clone(), "stream")?
        .with_request(request);
    run_filters(&filters, &mut ctx)?;
    if let Some(reply) = render(&mut ctx)? {
        println!("{} {}", reply.status(), String::from_utf8_lossy(reply.body()));
    }

    // log_all with a JSON body array
    let body = serde_json::json!({ "tags": ["a", "b", "c"] });
    let params = Params::new().with_body(Body::Json(body));
    let mut ctx = HandlerContext::for_action(Greeter::default(), actions, "log_all")?
        .with_params(params, BinderConfig::default());
    run_filters(&filters, &mut ctx)?;
    println!("logged {:?}", ctx.into_controller().log);

    Ok(())
}
