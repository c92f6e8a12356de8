use async_nats::HeaderMap;
use opentelemetry::{
    global,
    propagation::{Extractor, Injector},
    Context,
};
use tracing_opentelemetry::OpenTelemetrySpanExt;

const TRACEPARENT: &str = "traceparent";
const TRACESTATE: &str = "tracestate";

struct NatsHeaderInjector<'a>(&'a mut HeaderMap);

impl Injector for NatsHeaderInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        self.0.insert(key, value.as_str());
    }
}

struct NatsHeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for NatsHeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|v| v.as_str())
    }

    fn keys(&self) -> Vec<&str> {
        vec![TRACEPARENT, TRACESTATE]
    }
}

/// Extractor over inbound HTTP request headers
struct HttpHeaderExtractor<'a>(&'a http::HeaderMap);

impl Extractor for HttpHeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|k| k.as_str()).collect()
    }
}

/// Inject the current span's W3C trace context into NATS headers.
pub fn inject_trace_context(headers: &mut HeaderMap) {
    global::get_text_map_propagator(|propagator| {
        let ctx = tracing::Span::current().context();
        propagator.inject_context(&ctx, &mut NatsHeaderInjector(headers));
    });
}

/// Trace context propagated by the publisher of a message.
pub fn extract_trace_context(headers: &HeaderMap) -> Context {
    global::get_text_map_propagator(|propagator| propagator.extract(&NatsHeaderExtractor(headers)))
}

/// Trace context propagated by an HTTP caller.
pub fn extract_http_trace_context(headers: &http::HeaderMap) -> Context {
    global::get_text_map_propagator(|propagator| propagator.extract(&HttpHeaderExtractor(headers)))
}

/// Parent the current span to the trace that published the message.
pub fn set_parent_from_headers(headers: &HeaderMap) {
    let ctx = extract_trace_context(headers);
    tracing::Span::current().set_parent(ctx);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inject_without_propagator_does_not_panic() {
        let mut headers = HeaderMap::new();
        inject_trace_context(&mut headers);
        set_parent_from_headers(&headers);
    }

    #[test]
    fn test_nats_extractor_reads_traceparent() {
        let mut headers = HeaderMap::new();
        headers.insert(TRACEPARENT, "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01");

        let extractor = NatsHeaderExtractor(&headers);
        assert!(extractor.get(TRACEPARENT).unwrap().starts_with("00-"));
        assert!(extractor.get(TRACESTATE).is_none());
    }

    #[test]
    fn test_http_extractor_reads_headers() {
        let mut headers = http::HeaderMap::new();
        headers.insert(
            TRACEPARENT,
            http::HeaderValue::from_static("00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01"),
        );

        let extractor = HttpHeaderExtractor(&headers);
        assert!(extractor.get(TRACEPARENT).is_some());
        assert_eq!(extractor.keys(), vec![TRACEPARENT]);
        let _ctx = extract_http_trace_context(&headers);
    }
}
