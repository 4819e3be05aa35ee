use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_test::{assert_err, assert_ok};

use ai_failover::error::UNAVAILABLE_MESSAGE;
use ai_failover::
{   AiClient, Error, FailoverConfig, FailureKind, Provider, RequestOptions
  , ServiceError
};

/// What a scripted provider does when asked for a completion
#[derive(Clone)]
enum Reply
{   Text(&'static str)
  , Fail(Error)
  , Hang
}

/// In-process provider with a fixed script and call counters
struct Scripted
{   name: &'static str
  , available: bool
  , hang_probe: bool
  , reply: Reply
  , probes: AtomicUsize
  , requests: AtomicUsize
}

impl Scripted
{   fn new(name: &'static str, available: bool, reply: Reply) -> Arc<Self>
    {   Arc::new(Scripted
        {   name
          , available
          , hang_probe: false
          , reply
          , probes: AtomicUsize::new(0)
          , requests: AtomicUsize::new(0)
        })
    }

    fn ok(name: &'static str, text: &'static str) -> Arc<Self>
    {   Scripted::new(name, true, Reply::Text(text))
    }

    fn probes(&self) -> usize
    {   self.probes.load(Ordering::SeqCst)
    }

    fn requests(&self) -> usize
    {   self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for Scripted
{   fn name(&self) -> &str
    {   self.name
    }

    async fn probe(&self) -> bool
    {   self.probes.fetch_add(1, Ordering::SeqCst);
        if self.hang_probe
        {   tokio::time::sleep(Duration::from_secs(30)).await;
        }
        self.available
    }

    async fn request(&self, _prompt: &str, _options: &RequestOptions)
      -> Result<String, Error>
    {   self.requests.fetch_add(1, Ordering::SeqCst);
        match &self.reply
        {   Reply::Text(text) => Ok(text.to_string())
          , Reply::Fail(e) => Err(e.clone())
          , Reply::Hang => {
              tokio::time::sleep(Duration::from_secs(30)).await;
              Ok("too late".to_string())
            }
        }
    }
}

fn client(providers: &[Arc<Scripted>]) -> AiClient
{   AiClient::from_providers(
      providers.iter()
        .map(|p| Arc::clone(p) as Arc<dyn Provider>)
        .collect(),
      Duration::from_millis(200),
      Duration::from_millis(200)
    )
}

fn api_error(provider: &str, status: u16) -> Error
{   Error::ApiError
    {   provider: provider.to_string()
      , status
      , body: "{\"error\":\"key sk-live-123 over quota\"}".to_string()
    }
}

#[tokio::test]
async fn test_first_success_short_circuits()
{   let p1 = Scripted::ok("azure-primary", "from primary");
    let p2 = Scripted::ok("azure-secondary", "from secondary");
    let p3 = Scripted::ok("gemini", "from gemini");

    let result = assert_ok!(
      client(&[p1.clone(), p2.clone(), p3.clone()])
        .generate_response("hi", None)
        .await
    );

    assert_eq!(result.text, "from primary");
    assert_eq!(result.provider, "azure-primary");
    assert_eq!((p1.probes(), p1.requests()), (1, 1));
    assert_eq!((p2.probes(), p2.requests()), (0, 0));
    assert_eq!((p3.probes(), p3.requests()), (0, 0));
}

#[tokio::test]
async fn test_unavailable_probe_skips_request()
{   let p1 = Scripted::new("azure-primary", false, Reply::Text("never"));
    let p2 = Scripted::ok("azure-secondary", "second");

    let result = assert_ok!(
      client(&[p1.clone(), p2.clone()])
        .generate_response("hi", None)
        .await
    );

    assert_eq!(result.provider, "azure-secondary");
    assert_eq!(p1.probes(), 1);
    assert_eq!(p1.requests(), 0);
    assert_eq!(p2.requests(), 1);
}

#[tokio::test]
async fn test_request_error_fails_over()
{   let p1 = Scripted::new(
      "azure-primary", true, Reply::Fail(api_error("azure-primary", 500))
    );
    let p2 = Scripted::ok("gemini", "recovered");

    let report = client(&[p1.clone(), p2.clone()])
      .generate_response_with_report("hi", None)
      .await;

    let result = assert_ok!(report.result);
    assert_eq!(result.provider, "gemini");
    assert_eq!(result.text, "recovered");
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].provider, "azure-primary");
    assert!(matches!(
      report.failures[0].kind,
      FailureKind::Failed(Error::ApiError { status: 500, .. })
    ));
}

#[tokio::test]
async fn test_blank_completion_counts_as_failure()
{   let p1 = Scripted::ok("azure-primary", "");
    let p2 = Scripted::ok("azure-secondary", "  \n\t ");
    let p3 = Scripted::ok("deepseek", "real text");

    let report = client(&[p1.clone(), p2.clone(), p3.clone()])
      .generate_response_with_report("hi", None)
      .await;

    assert_eq!(assert_ok!(report.result).provider, "deepseek");
    let kinds: Vec<FailureKind> = report.failures
      .into_iter()
      .map(|f| f.kind)
      .collect();
    assert_eq!(
      kinds,
      vec![FailureKind::EmptyCompletion, FailureKind::EmptyCompletion]
    );
}

#[tokio::test]
async fn test_exhaustion_is_one_generic_error()
{   let p1 = Scripted::new("azure-primary", false, Reply::Text("x"));
    let p2 = Scripted::new(
      "azure-secondary", true, Reply::Fail(api_error("azure-secondary", 429))
    );
    let p3 = Scripted::new("gemini", true, Reply::Fail(Error::Timeout));
    let p4 = Scripted::ok("deepseek", "");

    let report = client(&[p1.clone(), p2.clone(), p3.clone(), p4.clone()])
      .generate_response_with_report("hi", None)
      .await;

    let err = assert_err!(report.result);
    assert_eq!(err, ServiceError::Exhausted { attempted: 4 });

    let message = err.to_string();
    assert_eq!(message, UNAVAILABLE_MESSAGE);
    for leak in ["azure", "gemini", "deepseek", "429", "sk-live"]
    {   assert!(!message.contains(leak), "message leaks {}", leak);
    }

    assert_eq!(report.failures.len(), 4);
    assert_eq!(report.failures[0].kind, FailureKind::Unavailable);
    assert_eq!(report.failures[2].kind, FailureKind::TimedOut);
    assert_eq!(report.failures[3].kind, FailureKind::EmptyCompletion);
}

#[tokio::test]
async fn test_zero_providers_fails_without_network()
{   let client = assert_ok!(AiClient::from_config(&FailoverConfig::default()));
    assert!(client.provider_names().is_empty());

    let err = assert_err!(client.generate_response("hi", None).await);
    assert_eq!(err, ServiceError::NoProvidersConfigured);
    assert_eq!(err.to_string(), UNAVAILABLE_MESSAGE);
    assert!(client.provider_status().await.is_empty());
}

#[tokio::test]
async fn test_hanging_request_times_out_and_fails_over()
{   let p1 = Scripted::new("azure-primary", true, Reply::Hang);
    let p2 = Scripted::ok("gemini", "in time");

    let started = std::time::Instant::now();
    let report = client(&[p1.clone(), p2.clone()])
      .generate_response_with_report("hi", None)
      .await;

    assert_eq!(assert_ok!(report.result).provider, "gemini");
    assert_eq!(report.failures[0].kind, FailureKind::TimedOut);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_hanging_probe_counts_as_unavailable()
{   let p1 = Arc::new(Scripted
    {   name: "azure-primary"
      , available: true
      , hang_probe: true
      , reply: Reply::Text("never")
      , probes: AtomicUsize::new(0)
      , requests: AtomicUsize::new(0)
    });
    let p2 = Scripted::ok("deepseek", "ok");

    let result = assert_ok!(
      client(&[p1.clone(), p2.clone()])
        .generate_response("hi", None)
        .await
    );

    assert_eq!(result.provider, "deepseek");
    assert_eq!(p1.requests(), 0);
}

#[tokio::test]
async fn test_status_probes_everyone_and_never_requests()
{   let p1 = Scripted::new("azure-primary", false, Reply::Text("x"));
    let p2 = Scripted::ok("gemini", "x");
    let p3 = Scripted::new("deepseek", false, Reply::Text("x"));

    let statuses = client(&[p1.clone(), p2.clone(), p3.clone()])
      .provider_status()
      .await;

    let table: Vec<(&str, bool)> = statuses
      .iter()
      .map(|s| (s.name.as_str(), s.available))
      .collect();
    assert_eq!(
      table,
      vec![("azure-primary", false), ("gemini", true), ("deepseek", false)]
    );
    for p in [&p1, &p2, &p3]
    {   assert_eq!(p.probes(), 1);
        assert_eq!(p.requests(), 0);
    }
}

#[tokio::test]
async fn test_calls_are_independent()
{   let p1 = Scripted::new(
      "azure-primary", true, Reply::Fail(api_error("azure-primary", 503))
    );
    let p2 = Scripted::ok("gemini", "shared");
    let client = client(&[p1.clone(), p2.clone()]);
    let injected = client.clone();

    let (a, b) = tokio::join!(
      client.generate_response("one", None),
      injected.generate_response("two", Some(RequestOptions::new()))
    );

    assert_eq!(assert_ok!(a).provider, "gemini");
    assert_eq!(assert_ok!(b).provider, "gemini");
    assert_eq!(p1.requests(), 2);
    assert_eq!(p2.requests(), 2);
}
