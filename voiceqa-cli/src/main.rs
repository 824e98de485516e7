use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use voiceqa_appcore::service::AppService;
use voiceqa_core::qa::ExchangePhase;
use voiceqa_engine::traits::CaptureSource;
use voiceqa_runtime::capture::{ScriptedCapture, UnavailableCapture};
use voiceqa_runtime::collaborators::BackendClient;
use voiceqa_runtime::local_synth::{CommandSynthesizer, NullSynthesizer};
use voiceqa_runtime::sink::{NullSink, RodioSink};
use voiceqa_runtime::state_store::STATE_FILE_NAME;

fn usage() -> ! {
    eprintln!("usage: voiceqa-cli [--url <source-url>]... (--ask <question> | --voice <utterance>)");
    eprintln!();
    eprintln!("environment:");
    eprintln!("  BACKEND_URL      backend base URL (default http://localhost:8000)");
    eprintln!("  VOICEQA_STATE    state file path (default ./{STATE_FILE_NAME})");
    eprintln!("  VOICEQA_AUDIO=1  play answers on the default audio device");
    eprintln!("  VOICEQA_SAY      local fallback synthesis command (e.g. espeak)");
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut urls: Vec<String> = Vec::new();
    let mut typed: Option<String> = None;
    let mut spoken: Option<String> = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--url" => urls.push(args.next().unwrap_or_else(|| usage())),
            "--ask" => typed = Some(args.next().unwrap_or_else(|| usage())),
            "--voice" => spoken = Some(args.next().unwrap_or_else(|| usage())),
            _ => usage(),
        }
    }
    if typed.is_none() && spoken.is_none() {
        usage();
    }

    let base_url =
        std::env::var("BACKEND_URL").unwrap_or_else(|_| "http://localhost:8000".into());
    let state_path = std::env::var("VOICEQA_STATE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(STATE_FILE_NAME));

    // Voice mode replays the utterance through the full recording pipeline;
    // otherwise the capture seat stays empty and recording degrades to a
    // no-op.
    let capture: Arc<dyn CaptureSource> = match &spoken {
        Some(utterance) => Arc::new(ScriptedCapture::utterance(utterance)),
        None => Arc::new(UnavailableCapture),
    };

    let sink: Arc<dyn voiceqa_engine::traits::AudioSink> =
        if std::env::var("VOICEQA_AUDIO").is_ok() {
            Arc::new(RodioSink::new())
        } else {
            Arc::new(NullSink)
        };

    let local_synth: Arc<dyn voiceqa_engine::traits::LocalSynthesizer> =
        match std::env::var("VOICEQA_SAY") {
            Ok(cmd) => Arc::new(CommandSynthesizer::new(
                cmd.split_whitespace().map(String::from).collect(),
            )),
            Err(_) => Arc::new(NullSynthesizer),
        };

    let service = Arc::new(AppService::new(
        state_path,
        Arc::new(BackendClient::new(base_url)),
        capture,
        local_synth,
        sink,
    ));

    for url in &urls {
        service.add_source_url(url).await?;
    }
    let state = service.snapshot();
    if let Some(notice) = &state.notice {
        println!("[notice] {notice}");
    }

    if let Some(question) = typed {
        report(&service, service.submit_question(&question).await);
        return Ok(());
    }

    // Voice mode: start recording, let the scripted utterance finalize, and
    // let the auto-submit watcher drive the exchange.
    let watcher = service.spawn_auto_submit();
    service.start_recording().await;

    let store = service.store();
    let mut rx = store.subscribe();
    let mut last_transcript = String::new();
    let answered = tokio::time::timeout(Duration::from_secs(45), async {
        loop {
            {
                let st = rx.borrow_and_update();
                if matches!(st.phase, ExchangePhase::Answered | ExchangePhase::Errored) {
                    return anyhow::Ok(st.clone());
                }
                if st.voice.transcript != last_transcript {
                    last_transcript = st.voice.transcript.clone();
                    eprintln!("[transcript] {last_transcript}");
                }
            }
            if rx.changed().await.is_err() {
                anyhow::bail!("store closed");
            }
        }
    })
    .await;

    service.stop_recording().await;
    watcher.abort();

    match answered {
        Ok(Ok(st)) => {
            match (&st.current_answer, &st.error) {
                (Some(answer), _) => {
                    println!("answer: {}", answer.text);
                    for source in &answer.sources {
                        println!("source: {source}");
                    }
                }
                (None, Some(error)) => println!("error: {error}"),
                (None, None) => println!("no answer produced"),
            }
            Ok(())
        }
        Ok(Err(e)) => Err(e),
        Err(_) => Err(anyhow::anyhow!("timed out waiting for an answer")),
    }
}

fn report(service: &AppService, result: voiceqa_engine::exchange::ExchangeResult) {
    match result.phase {
        ExchangePhase::Answered => {
            let answer = result.answer.expect("answered exchange has an answer");
            if result.guidance {
                println!("[guidance]");
            }
            println!("answer: {}", answer.text);
            for source in &answer.sources {
                println!("source: {source}");
            }
        }
        ExchangePhase::Errored => {
            println!("error: {}", result.error.unwrap_or_default());
        }
        _ => println!("nothing submitted"),
    }

    if let Some(notice) = service.snapshot().notice {
        println!("[notice] {notice}");
    }
}
