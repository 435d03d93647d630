//! Built-in intention handlers, registered at startup.
//!
//! Each handler is a free async fn taking the shared collaborators, the
//! triggering message and its extracted arguments. User-facing strings stay
//! in Spanish; they are part of the bot's voice.

use crate::convo::IntentRegistry;
use crate::error::PlaybackError;
use crate::media::{StoredSong, VideoHit, VoiceSink};
use crate::playback::{PlayerQueue, Song, SongMeta};
use crate::text::ParsedArguments;
use crate::{BotDeps, Card, GuildId, InboundMessage, Result};
use std::sync::Arc;

/// Context variable holding the last video search hits for a channel.
const SEARCH_RESULTS: &str = "search_results";

/// Context variable holding the last listed library songs for a channel.
const LIBRARY_SONGS: &str = "library_songs";

/// Register every built-in handler with its help text, in help-menu order.
pub fn register_builtins(registry: &mut IntentRegistry) {
    registry.register("help", help, HELP_DOC);
    registry.register("list_downloaded_songs", list_library, LIST_DOC);
    registry.register("yt_search", search_songs, SEARCH_DOC);
    registry.register("play_music", play_song, PLAY_DOC);
    registry.register("pause_music", pause_song, PAUSE_DOC);
    registry.register("resume_music", resume_song, RESUME_DOC);
    registry.register("skip_song", skip_song, SKIP_DOC);
    registry.register("set_player_volume", set_volume, VOLUME_DOC);
    registry.register("show_queue", show_queue, QUEUE_DOC);
    registry.register("leave_voice_channel", leave_voice, LEAVE_DOC);
}

const HELP_DOC: &str = "**Hola, mi nombre es Eri!**\n\nSolo soy un robot y no sé hacer muchas cosas 🤖 pero trataré de hacerlo lo mejor que pueda.\n\nPuedes tratar de hablarme de forma natural. Aquí algunas de las cosas que sé hacer:";

const LIST_DOC: &str = "**Listar las canciones descargadas**\n\nPara listar las canciones que he descargado di algo como:\n\n▪ ¿Eri qué canciones has descargado?\n▪ Eri lista de canciones descargadas\n\nDe la lista que aparezca puedes pedir una canción:\n\n▪ Eri pon la 3";

const SEARCH_DOC: &str = "**Buscar canciones**\n\nPara buscar canciones dime algo así:\n\n▪ Eri busca \"Ghost - Rats\"\n▪ Eri busca canciones de \"Metallica\"\n\nSe desplegará una lista numerada; para poner una canción puedes decir:\n\n▪ Eri pon la 2";

const PLAY_DOC: &str = "**Poner música**\n\nSi quieres escuchar una canción solo dime:\n\n▪ Eri pon \"Metallica - One\"\n\nRecuerda poner el nombre entre comillas; pondré el primer resultado que encuentre. También puedes indicarme el enlace a YouTube:\n\n▪ Eri reproduce http://youtube.com/...";

const PAUSE_DOC: &str = "**Pausar música**\n\nSi quieres que ponga pausa solo di algo como:\n\n▪ Pausa la musica eri\n▪ Eri pausar música";

const RESUME_DOC: &str = "**Quitar pausa**\n\nSi pausaste la música y quieres reanudar la reproducción di:\n\n▪ Eri play\n▪ Eri quita la pausa";

const SKIP_DOC: &str = "**Saltar canción**\n\nSi tienes más de una canción en lista puedes pedirme que la adelante:\n\n▪ adelanta la cancion eri\n▪ Eri siguiente canción";

const VOLUME_DOC: &str = "**Cambiar volumen de la música**\n\nSi el volumen está muy alto o muy bajo, pide que lo ajuste:\n\n▪ Eri volumen al 50\n▪ pon el volumen al 10 eri";

const QUEUE_DOC: &str = "**Ver la playlist**\n\nPara ver las siguientes canciones en la lista di algo como:\n\n▪ Eri ¿qué canciones siguen?\n▪ Eri muestra la playlist";

const LEAVE_DOC: &str = "**Salir del canal de voz**\n\nDime que deje el canal de voz:\n\n▪ sal de la llamada eri\n\nDe todas formas, si nadie pide una canción en 3 minutos de que terminó la última, yo saldré automáticamente 😙";

/// Never invoked: the dispatcher intercepts the `help` intention and emits
/// the help list itself. Registered so the doc above appears in that list.
async fn help(_deps: Arc<BotDeps>, _message: InboundMessage, _args: ParsedArguments) -> Result<()> {
    Ok(())
}

async fn play_song(
    deps: Arc<BotDeps>,
    message: InboundMessage,
    args: ParsedArguments,
) -> Result<()> {
    let Some(guild) = message.guild_id.clone() else {
        deps.chat
            .send_text(&message.channel_id, "Conectate a un canal de voz 🙄")
            .await?;
        return Ok(());
    };

    let sink = match deps.voice.connect(&guild, &message.author_id).await {
        Ok(sink) => sink,
        Err(PlaybackError::VoiceUnavailable { .. }) => {
            deps.chat
                .send_text(&message.channel_id, "Conectate a un canal de voz 🙄")
                .await?;
            return Ok(());
        }
        Err(error) => {
            tracing::warn!(guild_id = %guild, %error, "voice connect failed");
            deps.chat
                .send_text(&message.channel_id, "No pude entrar al canal de voz 😢")
                .await?;
            return Ok(());
        }
    };

    let resolved = match resolve_request(&deps, &message, &args).await? {
        Some(resolved) => resolved,
        None => return Ok(()),
    };

    let source = match deps.voice.open_source(&resolved.local_path) {
        Ok(source) => source,
        Err(error) => {
            tracing::warn!(guild_id = %guild, %error, path = %resolved.local_path.display(), "unplayable song file");
            deps.chat.react(&message.channel_id, &message.id, "😢").await?;
            deps.chat
                .send_text(&message.channel_id, "Lo siento no pude encontrarla :C")
                .await?;
            return Ok(());
        }
    };

    let queue = deps.players.get_or_create(
        &guild,
        &message.channel_id,
        Arc::clone(&deps.chat),
        sink,
    );
    let song = Song {
        source,
        meta: SongMeta {
            title: resolved.meta.title,
            thumbnail_url: resolved.meta.thumbnail_url,
            source_url: resolved.meta.source_url,
            requested_by: message.author_mention.clone(),
        },
    };
    if let Err(error) = queue.enqueue(song) {
        tracing::info!(guild_id = %guild, %error, "enqueue rejected");
        let notice = match error {
            PlaybackError::QueueFull { capacity, .. } => {
                format!("La playlist está llena ({capacity} canciones) 😵")
            }
            _ => "No pude agregar la canción 😢".to_string(),
        };
        deps.chat.send_text(&message.channel_id, &notice).await?;
        return Ok(());
    }

    send_playlist_card(&deps, &message, &queue).await
}

struct ResolvedSong {
    local_path: std::path::PathBuf,
    meta: SongMeta,
}

/// Turn the extracted arguments into a locally playable song, downloading
/// and recording it when needed. `None` means the user was already told why
/// nothing can play.
async fn resolve_request(
    deps: &Arc<BotDeps>,
    message: &InboundMessage,
    args: &ParsedArguments,
) -> Result<Option<ResolvedSong>> {
    if let Some(url) = &args.url {
        return download_and_record(deps, message, url).await;
    }

    if let Some(query) = &args.string {
        let hits = match deps.resolver.search(query).await {
            Ok(hits) => hits,
            Err(error) => {
                tracing::warn!(%error, query = %query, "video search failed");
                Vec::new()
            }
        };
        let Some(first) = hits.first() else {
            deps.chat
                .send_text(&message.channel_id, "Lo siento no pude encontrar tu rolita :C")
                .await?;
            return Ok(None);
        };
        return download_and_record(deps, message, &first.url).await;
    }

    if let Some(number) = args.number {
        return resolve_by_number(deps, message, number).await;
    }

    deps.chat
        .send_text(&message.channel_id, "¿Qué canción quieres?")
        .await?;
    Ok(None)
}

/// Positions refer to the last numbered list shown in this channel: search
/// hits win over the library listing, matching which list is on screen.
async fn resolve_by_number(
    deps: &Arc<BotDeps>,
    message: &InboundMessage,
    number: i64,
) -> Result<Option<ResolvedSong>> {
    let index = usize::try_from(number).ok();

    let hits: Vec<VideoHit> = serde_json::from_value(
        deps.context.get_var(&message.channel_id, SEARCH_RESULTS).await,
    )
    .unwrap_or_default();
    if !hits.is_empty() {
        let Some(hit) = index.and_then(|i| hits.get(i)) else {
            deps.chat
                .send_text(&message.channel_id, "No tengo esa canción en la lista 🤔")
                .await?;
            return Ok(None);
        };
        return download_and_record(deps, message, &hit.url).await;
    }

    let songs: Vec<StoredSong> = serde_json::from_value(
        deps.context.get_var(&message.channel_id, LIBRARY_SONGS).await,
    )
    .unwrap_or_default();
    if !songs.is_empty() {
        let Some(song) = index.and_then(|i| songs.get(i)) else {
            deps.chat
                .send_text(&message.channel_id, "No tengo esa canción en la lista 🤔")
                .await?;
            return Ok(None);
        };
        return Ok(Some(ResolvedSong {
            local_path: song.local_path.clone(),
            meta: SongMeta {
                title: song.title.clone(),
                thumbnail_url: song.thumbnail_url.clone(),
                source_url: song.source_url.clone(),
                requested_by: message.author_mention.clone(),
            },
        }));
    }

    deps.chat
        .send_text(&message.channel_id, "Primero realiza una busqueda 🤔")
        .await?;
    Ok(None)
}

async fn download_and_record(
    deps: &Arc<BotDeps>,
    message: &InboundMessage,
    url: &str,
) -> Result<Option<ResolvedSong>> {
    deps.chat
        .send_text(&message.channel_id, "Dame un segundo, necesito descargarla...")
        .await?;

    let track = match deps.resolver.download(url).await {
        Ok(track) => track,
        Err(error) => {
            tracing::warn!(%error, url = %url, "download failed");
            deps.chat.react(&message.channel_id, &message.id, "😢").await?;
            deps.chat
                .send_text(&message.channel_id, "Lo siento no pude encontrarla :C")
                .await?;
            return Ok(None);
        }
    };

    let stored = StoredSong {
        title: track.title.clone(),
        local_path: track.local_path.clone(),
        thumbnail_url: track.thumbnail_url.clone(),
        source_url: url.to_string(),
    };
    if let Err(error) = deps.songs.record(&stored).await {
        tracing::warn!(%error, title = %stored.title, "failed to record song metadata");
    }

    Ok(Some(ResolvedSong {
        local_path: track.local_path,
        meta: SongMeta {
            title: track.title,
            thumbnail_url: track.thumbnail_url,
            source_url: url.to_string(),
            requested_by: message.author_mention.clone(),
        },
    }))
}

async fn send_playlist_card(
    deps: &Arc<BotDeps>,
    message: &InboundMessage,
    queue: &Arc<PlayerQueue>,
) -> Result<()> {
    let upcoming = queue.peek_upcoming(5);
    if upcoming.is_empty() {
        return Ok(());
    }
    let listing: String = upcoming
        .iter()
        .map(|meta| format!("▪ {}\n", meta.title))
        .collect();
    let card = Card::new(listing).titled(format!("{} canciones en la playlist", queue.len()));
    deps.chat.send_card(&message.channel_id, &card).await
}

async fn search_songs(
    deps: Arc<BotDeps>,
    message: InboundMessage,
    args: ParsedArguments,
) -> Result<()> {
    let Some(query) = &args.string else {
        deps.chat.send_text(&message.channel_id, "¿Qué busco? 🤔").await?;
        return Ok(());
    };

    deps.chat
        .send_text(&message.channel_id, &format!("Buscando **{query}** 🧐"))
        .await?;

    let hits = match deps.resolver.search(query).await {
        Ok(hits) => hits,
        Err(error) => {
            tracing::warn!(%error, query = %query, "video search failed");
            Vec::new()
        }
    };
    if hits.is_empty() {
        deps.chat
            .send_text(&message.channel_id, "Lo siento tuve problemas con la busqueda 😅")
            .await?;
        return Ok(());
    }

    deps.context
        .set_var(
            &message.channel_id,
            SEARCH_RESULTS,
            serde_json::to_value(&hits).unwrap_or_default(),
        )
        .await;

    let listing: String = hits
        .iter()
        .enumerate()
        .map(|(i, hit)| format!("{i}.- [{}]({})\n", hit.title, hit.url))
        .collect();
    let card = Card::new(listing).titled(query.clone());
    deps.chat.send_card(&message.channel_id, &card).await
}

async fn list_library(
    deps: Arc<BotDeps>,
    message: InboundMessage,
    _args: ParsedArguments,
) -> Result<()> {
    let songs = match deps.songs.list().await {
        Ok(songs) => songs,
        Err(error) => {
            tracing::warn!(%error, "song store listing failed");
            deps.chat
                .send_text(&message.channel_id, "No pude leer mi lista de canciones 😢")
                .await?;
            return Ok(());
        }
    };

    let listing: String = songs
        .iter()
        .enumerate()
        .map(|(i, song)| format!("**{i}** - {}\n", song.title))
        .collect();
    let card = Card::new(listing).titled(format!("{} Canciones descargadas", songs.len()));
    deps.chat.send_card(&message.channel_id, &card).await?;

    deps.context
        .set_var(
            &message.channel_id,
            LIBRARY_SONGS,
            serde_json::to_value(&songs).unwrap_or_default(),
        )
        .await;
    deps.context
        .set_var(&message.channel_id, SEARCH_RESULTS, serde_json::Value::Null)
        .await;
    Ok(())
}

/// Sink for the guild's current voice connection, telling the user when
/// there is none. Shared gate for the pause/resume/skip/volume family.
async fn connected_sink(
    deps: &Arc<BotDeps>,
    message: &InboundMessage,
) -> Result<Option<(GuildId, Arc<dyn VoiceSink>)>> {
    let sink = match &message.guild_id {
        Some(guild) => deps.voice.current(guild).await.map(|sink| (guild.clone(), sink)),
        None => None,
    };
    if sink.is_none() {
        deps.chat
            .send_text(&message.channel_id, "No estoy conectada a ningun canal de voz 🙄")
            .await?;
    }
    Ok(sink)
}

async fn pause_song(
    deps: Arc<BotDeps>,
    message: InboundMessage,
    _args: ParsedArguments,
) -> Result<()> {
    let Some((_, sink)) = connected_sink(&deps, &message).await? else {
        return Ok(());
    };
    if !sink.is_playing() {
        deps.chat
            .send_text(&message.channel_id, "No se esta reproduciendo nada 🤔")
            .await?;
        return Ok(());
    }
    deps.chat.react(&message.channel_id, &message.id, "⏸").await?;
    sink.pause();
    Ok(())
}

async fn resume_song(
    deps: Arc<BotDeps>,
    message: InboundMessage,
    _args: ParsedArguments,
) -> Result<()> {
    let Some((_, sink)) = connected_sink(&deps, &message).await? else {
        return Ok(());
    };
    if !sink.is_paused() {
        deps.chat
            .send_text(&message.channel_id, "No hay música en pausa 🤔")
            .await?;
        return Ok(());
    }
    deps.chat.react(&message.channel_id, &message.id, "▶️").await?;
    deps.chat.send_text(&message.channel_id, "Fierro 🤠 👌").await?;
    sink.resume();
    Ok(())
}

async fn skip_song(
    deps: Arc<BotDeps>,
    message: InboundMessage,
    _args: ParsedArguments,
) -> Result<()> {
    let Some((_, sink)) = connected_sink(&deps, &message).await? else {
        return Ok(());
    };
    if !sink.is_playing() {
        deps.chat
            .send_text(&message.channel_id, "No se esta reproduciendo nada 🤔")
            .await?;
        return Ok(());
    }
    deps.chat.react(&message.channel_id, &message.id, "⏭").await?;
    // Stopping fires the track-done signal; the queue worker advances.
    sink.stop();
    Ok(())
}

async fn set_volume(
    deps: Arc<BotDeps>,
    message: InboundMessage,
    args: ParsedArguments,
) -> Result<()> {
    let Some((guild, _)) = connected_sink(&deps, &message).await? else {
        return Ok(());
    };
    let Some(number) = args.number else {
        deps.chat
            .send_text(&message.channel_id, "¿En cuánto pongo el volumen?")
            .await?;
        return Ok(());
    };

    // The user speaks percent; the player speaks [0.0, 1.0].
    let volume = number as f32 / 100.0;
    if let Err(error) = deps.players.set_volume(&guild, volume) {
        tracing::debug!(guild_id = %guild, %error, "volume change with no live queue");
        deps.chat
            .send_text(&message.channel_id, "No se esta reproduciendo nada 🙄")
            .await?;
        return Ok(());
    }

    deps.chat
        .send_text(&message.channel_id, &format!("Volumen: **{number}** 🔊"))
        .await
}

async fn show_queue(
    deps: Arc<BotDeps>,
    message: InboundMessage,
    _args: ParsedArguments,
) -> Result<()> {
    let queue = message.guild_id.as_ref().and_then(|guild| deps.players.get(guild));
    let Some(queue) = queue else {
        deps.chat
            .send_text(&message.channel_id, "No estoy reproduciendo nada 🤔")
            .await?;
        return Ok(());
    };
    if queue.is_empty() {
        deps.chat
            .send_text(&message.channel_id, "No hay más canciones en la lista 🤔")
            .await?;
        return Ok(());
    }
    send_playlist_card(&deps, &message, &queue).await
}

async fn leave_voice(
    deps: Arc<BotDeps>,
    message: InboundMessage,
    _args: ParsedArguments,
) -> Result<()> {
    let Some((guild, sink)) = connected_sink(&deps, &message).await? else {
        return Ok(());
    };

    deps.chat.react(&message.channel_id, &message.id, "☹️").await?;
    deps.chat
        .send_text(
            &message.channel_id,
            "Ay :c al fin que ni queria hablar con ustedes :'v 💔",
        )
        .await?;

    if let Some(queue) = deps.players.get(&guild) {
        deps.players.remove(&guild);
        // Destroy disconnects the sink exactly once.
        queue.destroy().await;
    } else {
        deps.players.remove(&guild);
        sink.disconnect().await;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlaybackConfig;
    use crate::convo::ContextStore;
    use crate::media::{
        AudioSource, DownloadedTrack, MediaResolver, MemorySongStore, SongStore, VoiceGateway,
        VoiceSink,
    };
    use crate::messaging::recording::RecordingChat;
    use crate::playback::PlayerRegistry;
    use crate::playback::queue::test_support::{FakeSink, FakeSource};
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};

    struct FakeResolver {
        hits: Vec<VideoHit>,
    }

    #[async_trait]
    impl MediaResolver for FakeResolver {
        async fn search(&self, _query: &str) -> anyhow::Result<Vec<VideoHit>> {
            Ok(self.hits.clone())
        }

        async fn download(&self, url: &str) -> std::result::Result<DownloadedTrack, PlaybackError> {
            let hit = self.hits.iter().find(|hit| hit.url == url);
            Ok(DownloadedTrack {
                local_path: PathBuf::from("/tmp/song.mp3"),
                title: hit.map_or_else(|| "descarga directa".to_string(), |h| h.title.clone()),
                thumbnail_url: "http://example.test/thumb.jpg".into(),
            })
        }
    }

    struct FakeGateway {
        sink: Option<Arc<FakeSink>>,
    }

    #[async_trait]
    impl VoiceGateway for FakeGateway {
        async fn connect(
            &self,
            guild_id: &GuildId,
            _author_id: &str,
        ) -> std::result::Result<Arc<dyn VoiceSink>, PlaybackError> {
            match &self.sink {
                Some(sink) => Ok(Arc::clone(sink) as Arc<dyn VoiceSink>),
                None => Err(PlaybackError::VoiceUnavailable {
                    guild_id: guild_id.to_string(),
                }),
            }
        }

        async fn current(&self, _guild_id: &GuildId) -> Option<Arc<dyn VoiceSink>> {
            self.sink
                .as_ref()
                .filter(|sink| sink.is_connected())
                .map(|sink| Arc::clone(sink) as Arc<dyn VoiceSink>)
        }

        fn open_source(
            &self,
            _local_path: &Path,
        ) -> std::result::Result<Arc<dyn AudioSource>, PlaybackError> {
            Ok(FakeSource::new())
        }
    }

    struct Fixture {
        chat: Arc<RecordingChat>,
        sink: Arc<FakeSink>,
        deps: Arc<BotDeps>,
    }

    fn fixture(hits: Vec<VideoHit>, in_voice: bool) -> Fixture {
        let chat = Arc::new(RecordingChat::default());
        let sink = FakeSink::new(true);
        let deps = Arc::new(BotDeps {
            chat: chat.clone(),
            context: ContextStore::default(),
            players: Arc::new(PlayerRegistry::new(PlaybackConfig::default())),
            voice: Arc::new(FakeGateway {
                sink: in_voice.then(|| Arc::clone(&sink)),
            }),
            resolver: Arc::new(FakeResolver { hits }),
            songs: Arc::new(MemorySongStore::default()),
        });
        Fixture { chat, sink, deps }
    }

    fn message(content: &str) -> InboundMessage {
        InboundMessage::text("music", "user-1", content).with_guild("guild-1")
    }

    fn hit(title: &str, url: &str) -> VideoHit {
        VideoHit {
            url: url.into(),
            title: title.into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn play_without_voice_channel_is_refused() {
        let fx = fixture(vec![], false);
        play_song(fx.deps.clone(), message("Eri pon musica"), ParsedArguments::default())
            .await
            .unwrap();
        assert_eq!(fx.chat.texts_for("music"), ["Conectate a un canal de voz 🙄"]);
    }

    #[tokio::test(start_paused = true)]
    async fn play_by_url_downloads_records_and_enqueues() {
        let fx = fixture(vec![], true);
        let args = ParsedArguments {
            url: Some("http://www.youtube.com/watch?v=abcdefghijk".into()),
            ..Default::default()
        };
        play_song(fx.deps.clone(), message("Eri reproduce ..."), args)
            .await
            .unwrap();

        let texts = fx.chat.texts_for("music");
        assert_eq!(texts[0], "Dame un segundo, necesito descargarla...");

        let stored = fx.deps.songs.list().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].source_url, "http://www.youtube.com/watch?v=abcdefghijk");

        let queue = fx.deps.players.get(&GuildId::from("guild-1")).unwrap();
        assert!(queue.is_active());
        queue.destroy().await;
    }

    #[tokio::test(start_paused = true)]
    async fn play_by_quoted_search_uses_the_first_hit() {
        let fx = fixture(
            vec![hit("Ghost - Rats", "http://y.t/1"), hit("otra", "http://y.t/2")],
            true,
        );
        let args = ParsedArguments {
            string: Some("Ghost - Rats".into()),
            ..Default::default()
        };
        play_song(fx.deps.clone(), message("Eri pon \"Ghost - Rats\""), args)
            .await
            .unwrap();

        let stored = fx.deps.songs.list().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].title, "Ghost - Rats");

        fx.deps
            .players
            .get(&GuildId::from("guild-1"))
            .unwrap()
            .destroy()
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn play_by_number_without_prior_listing_asks_for_a_search() {
        let fx = fixture(vec![], true);
        let args = ParsedArguments {
            number: Some(2),
            ..Default::default()
        };
        play_song(fx.deps.clone(), message("Eri pon la 2"), args)
            .await
            .unwrap();
        assert_eq!(fx.chat.texts_for("music"), ["Primero realiza una busqueda 🤔"]);
    }

    #[tokio::test(start_paused = true)]
    async fn play_by_number_picks_from_stored_search_results() {
        let fx = fixture(vec![hit("elegida", "http://y.t/9")], true);
        let hits = vec![hit("cero", "http://y.t/0"), hit("elegida", "http://y.t/9")];
        fx.deps
            .context
            .set_var(
                &crate::ChannelId::from("music"),
                SEARCH_RESULTS,
                serde_json::to_value(&hits).unwrap(),
            )
            .await;

        let args = ParsedArguments {
            number: Some(1),
            ..Default::default()
        };
        play_song(fx.deps.clone(), message("Eri pon la 1"), args)
            .await
            .unwrap();

        let stored = fx.deps.songs.list().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].title, "elegida");

        fx.deps
            .players
            .get(&GuildId::from("guild-1"))
            .unwrap()
            .destroy()
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn play_with_no_arguments_asks_which_song() {
        let fx = fixture(vec![], true);
        play_song(fx.deps.clone(), message("Eri pon musica"), ParsedArguments::default())
            .await
            .unwrap();
        assert_eq!(fx.chat.texts_for("music"), ["¿Qué canción quieres?"]);
    }

    #[tokio::test]
    async fn search_without_string_asks_what_to_search() {
        let fx = fixture(vec![], true);
        search_songs(fx.deps.clone(), message("Eri busca"), ParsedArguments::default())
            .await
            .unwrap();
        assert_eq!(fx.chat.texts_for("music"), ["¿Qué busco? 🤔"]);
    }

    #[tokio::test]
    async fn search_stores_hits_and_numbers_them_from_zero() {
        let fx = fixture(vec![hit("uno", "http://y.t/1"), hit("dos", "http://y.t/2")], true);
        let args = ParsedArguments {
            string: Some("rolas".into()),
            ..Default::default()
        };
        search_songs(fx.deps.clone(), message("Eri busca \"rolas\""), args)
            .await
            .unwrap();

        let cards = fx.chat.cards_for("music");
        assert_eq!(cards.len(), 1);
        assert!(cards[0].description.starts_with("0.- [uno]"));
        assert!(cards[0].description.contains("1.- [dos]"));

        let stored: Vec<VideoHit> = serde_json::from_value(
            fx.deps
                .context
                .get_var(&crate::ChannelId::from("music"), SEARCH_RESULTS)
                .await,
        )
        .unwrap();
        assert_eq!(stored.len(), 2);
    }

    #[tokio::test]
    async fn list_library_publishes_context_and_clears_search() {
        let fx = fixture(vec![], true);
        fx.deps
            .songs
            .record(&StoredSong {
                title: "guardada".into(),
                local_path: PathBuf::from("/tmp/guardada.mp3"),
                thumbnail_url: String::new(),
                source_url: "http://y.t/s".into(),
            })
            .await
            .unwrap();
        let channel = crate::ChannelId::from("music");
        fx.deps
            .context
            .set_var(&channel, SEARCH_RESULTS, serde_json::json!([{"url": "x", "title": "y"}]))
            .await;

        list_library(fx.deps.clone(), message("Eri lista"), ParsedArguments::default())
            .await
            .unwrap();

        let cards = fx.chat.cards_for("music");
        assert_eq!(cards[0].title.as_deref(), Some("1 Canciones descargadas"));
        assert!(cards[0].description.contains("guardada"));

        let library: Vec<StoredSong> =
            serde_json::from_value(fx.deps.context.get_var(&channel, LIBRARY_SONGS).await).unwrap();
        assert_eq!(library[0].title, "guardada");
        assert!(fx.deps.context.get_var(&channel, SEARCH_RESULTS).await.is_null());
    }

    #[tokio::test]
    async fn pause_when_nothing_is_playing_says_so() {
        let fx = fixture(vec![], true);
        pause_song(fx.deps.clone(), message("pausa eri"), ParsedArguments::default())
            .await
            .unwrap();
        assert_eq!(fx.chat.texts_for("music"), ["No se esta reproduciendo nada 🤔"]);
    }

    #[tokio::test]
    async fn pause_and_resume_drive_the_sink() {
        use std::sync::atomic::Ordering;

        let fx = fixture(vec![], true);
        fx.sink.playing.store(true, Ordering::SeqCst);
        pause_song(fx.deps.clone(), message("pausa eri"), ParsedArguments::default())
            .await
            .unwrap();
        assert!(fx.sink.is_paused());

        resume_song(fx.deps.clone(), message("Eri play"), ParsedArguments::default())
            .await
            .unwrap();
        assert!(!fx.sink.is_paused());
        assert!(fx.chat.texts_for("music").contains(&"Fierro 🤠 👌".to_string()));
    }

    #[tokio::test]
    async fn volume_is_percent_and_clamped() {
        let fx = fixture(vec![], true);
        let queue = fx.deps.players.get_or_create(
            &GuildId::from("guild-1"),
            &crate::ChannelId::from("music"),
            fx.deps.chat.clone(),
            fx.sink.clone(),
        );

        let args = ParsedArguments {
            number: Some(50),
            ..Default::default()
        };
        set_volume(fx.deps.clone(), message("Eri volumen al 50"), args)
            .await
            .unwrap();
        assert_eq!(queue.volume(), 0.5);
        assert!(fx.chat.texts_for("music").contains(&"Volumen: **50** 🔊".to_string()));

        let args = ParsedArguments {
            number: Some(300),
            ..Default::default()
        };
        set_volume(fx.deps.clone(), message("Eri volumen al 300"), args)
            .await
            .unwrap();
        assert_eq!(queue.volume(), 1.0);

        queue.destroy().await;
    }

    #[tokio::test]
    async fn show_queue_without_a_live_queue_says_so() {
        let fx = fixture(vec![], true);
        show_queue(fx.deps.clone(), message("Eri muestra la playlist"), ParsedArguments::default())
            .await
            .unwrap();
        assert_eq!(fx.chat.texts_for("music"), ["No estoy reproduciendo nada 🤔"]);
    }

    #[tokio::test(start_paused = true)]
    async fn show_queue_lists_upcoming_songs() {
        use crate::playback::queue::test_support::song;

        let fx = fixture(vec![], true);
        let sink = FakeSink::new(false);
        let queue = fx.deps.players.get_or_create(
            &GuildId::from("guild-1"),
            &crate::ChannelId::from("music"),
            fx.deps.chat.clone(),
            sink,
        );
        queue.enqueue(song("actual")).unwrap();
        queue.enqueue(song("siguiente")).unwrap();
        // Let the worker pick up the head song so only the tail is pending.
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        show_queue(fx.deps.clone(), message("Eri muestra la playlist"), ParsedArguments::default())
            .await
            .unwrap();

        let cards = fx.chat.cards_for("music");
        let listing = &cards.last().unwrap().description;
        assert!(listing.contains("siguiente"));
        assert!(!listing.contains("actual"));

        queue.destroy().await;
    }

    #[tokio::test(start_paused = true)]
    async fn leave_voice_destroys_and_deregisters_the_queue() {
        use std::sync::atomic::Ordering;

        let fx = fixture(vec![], true);
        let guild = GuildId::from("guild-1");
        let queue = fx.deps.players.get_or_create(
            &guild,
            &crate::ChannelId::from("music"),
            fx.deps.chat.clone(),
            fx.sink.clone(),
        );

        leave_voice(fx.deps.clone(), message("sal de la llamada eri"), ParsedArguments::default())
            .await
            .unwrap();

        assert!(!queue.is_active());
        assert!(fx.deps.players.get(&guild).is_none());
        assert_eq!(fx.sink.disconnects.load(Ordering::SeqCst), 1);
    }
}
