use std::sync::Arc;

use narrate_subtitle::RenderSink;
use narrate_synthesis::Synthesizer;
use ractor::{Actor, ActorName, ActorProcessingErr, ActorRef, RpcReplyPort};
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::{
    Command, Completion, DurationProbe, Error, MediaEngine, MediaEvent, PlaybackScheduler,
    PlayerConfig, PlayerRuntime, PlayerSnapshot,
};

pub enum PlayerMsg {
    Start(String, RpcReplyPort<Result<(), Error>>),
    Pause,
    Resume,
    Stop,
    Seek(f64),
    SeekFraction(f64),
    Nudge(f64),
    SetPlaybackRate(f32),
    SetVoice(String),
    Media(MediaEvent),
    Completed(Completion),
    GetSnapshot(RpcReplyPort<PlayerSnapshot>),
}

pub struct PlayerArgs {
    pub config: PlayerConfig,
    pub runtime: Arc<dyn PlayerRuntime>,
    pub synthesizer: Arc<dyn Synthesizer>,
    pub probe: Arc<dyn DurationProbe>,
    pub media: Box<dyn MediaEngine>,
    pub sink: Box<dyn RenderSink>,
}

pub struct PlayerActorState {
    scheduler: PlaybackScheduler,
    synthesizer: Arc<dyn Synthesizer>,
    probe: Arc<dyn DurationProbe>,
    media: Box<dyn MediaEngine>,
    sink: Box<dyn RenderSink>,
}

/// Owns the scheduler. Its mailbox is the only place playback state is
/// mutated; fetches and timers run as tasks that report back via
/// [`PlayerMsg::Completed`].
pub struct PlayerActor;

impl PlayerActor {
    pub fn name() -> ActorName {
        "narrate_player_actor".into()
    }
}

pub async fn spawn_player(
    name: Option<ActorName>,
    args: PlayerArgs,
) -> Result<(ActorRef<PlayerMsg>, JoinHandle<()>), Error> {
    Ok(Actor::spawn(name, PlayerActor, args).await?)
}

#[ractor::async_trait]
impl Actor for PlayerActor {
    type Msg = PlayerMsg;
    type State = PlayerActorState;
    type Arguments = PlayerArgs;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        Ok(PlayerActorState {
            scheduler: PlaybackScheduler::new(args.config, args.runtime),
            synthesizer: args.synthesizer,
            probe: args.probe,
            media: args.media,
            sink: args.sink,
        })
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        let PlayerActorState {
            scheduler,
            media,
            sink,
            ..
        } = &mut *state;
        let media = media.as_mut();
        let sink = sink.as_mut();

        let commands = match message {
            PlayerMsg::Start(text, reply) => match scheduler.start(&text, media, sink) {
                Ok(commands) => {
                    let _ = reply.send(Ok(()));
                    commands
                }
                Err(error) => {
                    tracing::warn!(%error, "start_rejected");
                    let _ = reply.send(Err(error));
                    Vec::new()
                }
            },
            PlayerMsg::Pause => {
                scheduler.pause(media);
                Vec::new()
            }
            PlayerMsg::Resume => {
                scheduler.resume(media);
                Vec::new()
            }
            PlayerMsg::Stop => {
                scheduler.stop(media, sink);
                Vec::new()
            }
            PlayerMsg::Seek(target) => scheduler.seek(target, media, sink),
            PlayerMsg::SeekFraction(fraction) => scheduler.seek_fraction(fraction, media, sink),
            PlayerMsg::Nudge(delta) => {
                scheduler.nudge(delta, media, sink);
                Vec::new()
            }
            PlayerMsg::SetPlaybackRate(rate) => {
                scheduler.set_playback_rate(rate, media);
                Vec::new()
            }
            PlayerMsg::SetVoice(voice) => {
                scheduler.set_voice(voice);
                Vec::new()
            }
            PlayerMsg::Media(event) => scheduler.on_media_event(event, media, sink),
            PlayerMsg::Completed(completion) => scheduler.on_completion(completion, media, sink),
            PlayerMsg::GetSnapshot(reply) => {
                let _ = reply.send(scheduler.snapshot());
                Vec::new()
            }
        };

        dispatch(&myself, state, commands);
        Ok(())
    }
}

fn dispatch(myself: &ActorRef<PlayerMsg>, state: &PlayerActorState, commands: Vec<Command>) {
    if commands.is_empty() {
        return;
    }
    let span = state.scheduler.span();

    for command in commands {
        let actor = myself.clone();
        match command {
            Command::Synthesize {
                ticket,
                request,
                purpose,
            } => {
                let synthesizer = state.synthesizer.clone();
                tokio::spawn(
                    async move {
                        let result = synthesizer.synthesize(&request).await;
                        deliver(
                            &actor,
                            Completion::Synthesized {
                                ticket,
                                purpose,
                                result,
                            },
                        );
                    }
                    .instrument(span.clone()),
                );
            }
            Command::ResolveDuration { ticket, audio_ref } => {
                let probe = state.probe.clone();
                tokio::spawn(
                    async move {
                        let result = probe.probe(&audio_ref).await;
                        deliver(&actor, Completion::DurationResolved { ticket, result });
                    }
                    .instrument(span.clone()),
                );
            }
            Command::FetchSubtitles {
                ticket,
                load,
                subtitle_ref,
            } => {
                let synthesizer = state.synthesizer.clone();
                tokio::spawn(
                    async move {
                        let result = synthesizer.fetch_transcript(&subtitle_ref).await;
                        deliver(
                            &actor,
                            Completion::SubtitlesFetched {
                                ticket,
                                load,
                                result,
                            },
                        );
                    }
                    .instrument(span.clone()),
                );
            }
            Command::RetryLoad {
                ticket,
                load,
                seek,
                attempt,
                after,
            } => {
                tokio::spawn(
                    async move {
                        tokio::time::sleep(after).await;
                        deliver(
                            &actor,
                            Completion::RetryDue {
                                ticket,
                                load,
                                seek,
                                attempt,
                            },
                        );
                    }
                    .instrument(span.clone()),
                );
            }
        }
    }
}

fn deliver(actor: &ActorRef<PlayerMsg>, completion: Completion) {
    if let Err(error) = actor.cast(PlayerMsg::Completed(completion)) {
        tracing::debug!(?error, "player_gone_dropping_completion");
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use narrate_synthesis::{BoxFuture, SynthesisRequest, SynthesisResponse};

    use super::*;
    use crate::testing::{FakeMedia, RecordingRuntime, RecordingSink, passage, srt};
    use crate::{ChunkStatus, PlayerErrorEvent, PlayerState};

    struct FakeSynth {
        fail: bool,
        delay: Duration,
    }

    impl Synthesizer for FakeSynth {
        fn synthesize<'a>(
            &'a self,
            request: &'a SynthesisRequest,
        ) -> BoxFuture<'a, Result<SynthesisResponse, narrate_synthesis::Error>> {
            Box::pin(async move {
                tokio::time::sleep(self.delay).await;
                if self.fail {
                    return Err(narrate_synthesis::Error::Status {
                        status: 500,
                        message: "synthesis failed".into(),
                    });
                }
                let id = request.text.split_whitespace().next().unwrap_or_default();
                Ok(SynthesisResponse {
                    audio_url: format!("mem://{id}.mp3"),
                    subtitle_url: format!("mem://{id}.srt"),
                })
            })
        }

        fn fetch_transcript<'a>(
            &'a self,
            _subtitle_ref: &'a str,
        ) -> BoxFuture<'a, Result<String, narrate_synthesis::Error>> {
            Box::pin(async { Ok(srt(15, 0.4)) })
        }
    }

    struct FixedProbe;

    impl DurationProbe for FixedProbe {
        fn probe<'a>(&'a self, _audio_ref: &'a str) -> BoxFuture<'a, Result<f64, Error>> {
            Box::pin(async { Ok(6.0) })
        }
    }

    struct Fixture {
        actor: ActorRef<PlayerMsg>,
        media: FakeMedia,
        sink: RecordingSink,
        runtime: Arc<RecordingRuntime>,
    }

    async fn fixture(synth: FakeSynth) -> Fixture {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let media = FakeMedia::default();
        let sink = RecordingSink::default();
        let runtime = Arc::new(RecordingRuntime::default());

        let (actor, _handle) = spawn_player(
            None,
            PlayerArgs {
                config: PlayerConfig {
                    buffer_poll_ms: 10,
                    ..Default::default()
                },
                runtime: runtime.clone(),
                synthesizer: Arc::new(synth),
                probe: Arc::new(FixedProbe),
                media: Box::new(media.clone()),
                sink: Box::new(sink.clone()),
            },
        )
        .await
        .unwrap();

        Fixture {
            actor,
            media,
            sink,
            runtime,
        }
    }

    async fn snapshot(actor: &ActorRef<PlayerMsg>) -> PlayerSnapshot {
        ractor::call!(actor, PlayerMsg::GetSnapshot).unwrap()
    }

    async fn wait_for(
        actor: &ActorRef<PlayerMsg>,
        check: impl Fn(&PlayerSnapshot) -> bool,
    ) -> PlayerSnapshot {
        for _ in 0..200 {
            let snap = snapshot(actor).await;
            if check(&snap) {
                return snap;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached: {:?}", snapshot(actor).await);
    }

    #[tokio::test]
    async fn plays_through_prefetched_chunks() {
        let f = fixture(FakeSynth {
            fail: false,
            delay: Duration::ZERO,
        })
        .await;

        let started = ractor::call!(f.actor, PlayerMsg::Start, passage(3)).unwrap();
        assert!(started.is_ok());

        wait_for(&f.actor, |s| s.chunks.get(2) == Some(&ChunkStatus::Ready)).await;
        assert_eq!(f.media.log().source.as_deref(), Some("mem://p0word0.mp3"));

        f.actor.cast(PlayerMsg::Media(f.media.can_play())).unwrap();
        f.actor
            .cast(PlayerMsg::Media(MediaEvent::TimeUpdate { current_time: 0.5 }))
            .unwrap();
        let snap = wait_for(&f.actor, |s| s.current_word == Some(1)).await;
        assert_eq!(snap.state, PlayerState::Playing);
        assert!(f.sink.marks().highlighted.contains(&1));

        f.actor.cast(PlayerMsg::Media(MediaEvent::Ended)).unwrap();
        wait_for(&f.actor, |s| s.current_chunk == Some(1)).await;
        f.actor.cast(PlayerMsg::Media(f.media.can_play())).unwrap();
        let snap = wait_for(&f.actor, |s| {
            s.current_chunk == Some(1) && s.state == PlayerState::Playing
        })
        .await;
        assert_eq!(f.media.log().source.as_deref(), Some("mem://p1word0.mp3"));
        assert!(snap.progress.total >= 12.0);

        f.actor.cast(PlayerMsg::Stop).unwrap();
        let snap = wait_for(&f.actor, |s| s.state == PlayerState::Idle).await;
        assert!(snap.chunks.is_empty());
        assert_eq!(snap.session_id, None);
    }

    #[tokio::test]
    async fn empty_text_is_rejected() {
        let f = fixture(FakeSynth {
            fail: false,
            delay: Duration::ZERO,
        })
        .await;

        let result = ractor::call!(f.actor, PlayerMsg::Start, "   ".to_string()).unwrap();

        assert!(matches!(result, Err(Error::EmptyText)));
        assert_eq!(snapshot(&f.actor).await.state, PlayerState::Idle);
    }

    #[tokio::test]
    async fn synthesis_failure_ends_in_error_state() {
        let f = fixture(FakeSynth {
            fail: true,
            delay: Duration::ZERO,
        })
        .await;

        ractor::call!(f.actor, PlayerMsg::Start, passage(2))
            .unwrap()
            .unwrap();

        let snap = wait_for(&f.actor, |s| s.state == PlayerState::Error).await;
        assert!(snap.chunks.is_empty());
        assert!(matches!(
            f.runtime.errors().as_slice(),
            [PlayerErrorEvent::ChunkFailed { chunk_number: 1, .. }]
        ));
    }

    #[tokio::test]
    async fn results_arriving_after_stop_are_dropped() {
        let f = fixture(FakeSynth {
            fail: false,
            delay: Duration::from_millis(30),
        })
        .await;

        ractor::call!(f.actor, PlayerMsg::Start, passage(2))
            .unwrap()
            .unwrap();
        f.actor.cast(PlayerMsg::Stop).unwrap();

        tokio::time::sleep(Duration::from_millis(80)).await;

        let snap = snapshot(&f.actor).await;
        assert_eq!(snap.state, PlayerState::Idle);
        assert!(snap.chunks.is_empty());
        assert!(f.media.log().sources.is_empty());
    }
}
