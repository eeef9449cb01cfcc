//! For middleware [m1, m2, m3] around base b, the entering order is
//! m1, m2, m3 and the returning order is m3, m2, m1 — observed by a probe
//! middleware appending markers on both sides of the inner call.

use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use modelgate_core::{BoxLlmService, Chain, LlmError, LlmRequest, LlmResponse};
use tower::{Layer, Service, ServiceExt};

use crate::support;

#[derive(Clone)]
struct Probe {
    tag: &'static str,
    trace: Arc<Mutex<Vec<String>>>,
}

impl Probe {
    fn new(tag: &'static str, trace: &Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            tag,
            trace: Arc::clone(trace),
        }
    }
}

impl Layer<BoxLlmService> for Probe {
    type Service = ProbeService;

    fn layer(&self, inner: BoxLlmService) -> Self::Service {
        ProbeService {
            tag: self.tag,
            trace: Arc::clone(&self.trace),
            inner,
        }
    }
}

#[derive(Clone)]
struct ProbeService {
    tag: &'static str,
    trace: Arc<Mutex<Vec<String>>>,
    inner: BoxLlmService,
}

impl Service<LlmRequest> for ProbeService {
    type Response = LlmResponse;
    type Error = LlmError;
    type Future = BoxFuture<'static, Result<LlmResponse, LlmError>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: LlmRequest) -> Self::Future {
        let tag = self.tag;
        let trace = Arc::clone(&self.trace);
        let mut inner = self.inner.clone();
        Box::pin(async move {
            trace.lock().unwrap().push(format!(">{tag}"));
            let result = inner.ready().await?.call(req).await;
            trace.lock().unwrap().push(format!("<{tag}"));
            result
        })
    }
}

#[tokio::test]
async fn first_added_is_outermost() {
    let trace = Arc::new(Mutex::new(Vec::new()));
    let chain = Chain::new()
        .with(Probe::new("m1", &trace))
        .with(Probe::new("m2", &trace))
        .with(Probe::new("m3", &trace));

    let base = modelgate_core::handler_fn(|_req| async { Ok(support::response("ok")) });
    let svc = chain.apply(base);
    svc.oneshot(support::request("hi")).await.unwrap();

    assert_eq!(
        *trace.lock().unwrap(),
        vec![">m1", ">m2", ">m3", "<m3", "<m2", "<m1"]
    );
}

#[tokio::test]
async fn short_circuiting_skips_inner_layers() {
    #[derive(Clone)]
    struct ShortCircuit;

    #[derive(Clone)]
    struct ShortCircuitService;

    impl Layer<BoxLlmService> for ShortCircuit {
        type Service = ShortCircuitService;

        fn layer(&self, _inner: BoxLlmService) -> Self::Service {
            ShortCircuitService
        }
    }

    impl Service<LlmRequest> for ShortCircuitService {
        type Response = LlmResponse;
        type Error = LlmError;
        type Future = BoxFuture<'static, Result<LlmResponse, LlmError>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, _req: LlmRequest) -> Self::Future {
            Box::pin(async { Ok(support::response("short-circuit")) })
        }
    }

    let trace = Arc::new(Mutex::new(Vec::new()));
    let chain = Chain::new()
        .with(Probe::new("outer", &trace))
        .with(ShortCircuit)
        .with(Probe::new("inner", &trace));

    let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let svc = chain.apply(support::counting_ok("base", Arc::clone(&calls)));
    let resp = svc.oneshot(support::request("hi")).await.unwrap();

    assert_eq!(support::text_of(resp), "short-circuit");
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    assert_eq!(*trace.lock().unwrap(), vec![">outer", "<outer"]);
}
