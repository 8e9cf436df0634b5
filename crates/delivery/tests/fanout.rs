//! Fan-out-Szenarien ueber Registry, Broadcast-Engine und Stream-Handler

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use plauder_core::{RoomKey, UserIdentity};
use plauder_delivery::{
    Beendigung, BroadcastEngine, BroadcastKonfig, BroadcastPayload, ConnectionRegistry,
    DeliveryError, MembershipError, MembershipLookup, OutboundSink, Session, SessionZustand,
    SinkError, StatischeMitglieder, StreamHandler,
};

// ---------------------------------------------------------------------------
// Hilfsfunktionen
// ---------------------------------------------------------------------------

struct TestSink {
    pushes: AtomicUsize,
    fehler: Option<SinkError>,
    verzoegerung: Duration,
}

impl TestSink {
    fn ok() -> Arc<Self> {
        Self::mit(None, Duration::ZERO)
    }

    fn kaputt() -> Arc<Self> {
        Self::mit(Some(SinkError::Geschlossen), Duration::ZERO)
    }

    fn langsam(verzoegerung: Duration) -> Arc<Self> {
        Self::mit(None, verzoegerung)
    }

    fn mit(fehler: Option<SinkError>, verzoegerung: Duration) -> Arc<Self> {
        Arc::new(Self {
            pushes: AtomicUsize::new(0),
            fehler,
            verzoegerung,
        })
    }

    fn pushes(&self) -> usize {
        self.pushes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OutboundSink for TestSink {
    async fn push(&self, _payload: Arc<BroadcastPayload>) -> Result<(), SinkError> {
        if !self.verzoegerung.is_zero() {
            tokio::time::sleep(self.verzoegerung).await;
        }
        self.pushes.fetch_add(1, Ordering::SeqCst);
        match &self.fehler {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

struct KaputteDatenbank;

#[async_trait]
impl MembershipLookup for KaputteDatenbank {
    async fn mitglieder(&self, _room_key: &RoomKey) -> Result<Vec<UserIdentity>, MembershipError> {
        Err(MembershipError::Upstream("database is locked".into()))
    }
}

fn id(s: &str) -> UserIdentity {
    UserIdentity::neu(format!("{s}@example.com")).unwrap()
}

fn raum(s: &str) -> RoomKey {
    RoomKey::neu(s).unwrap()
}

fn verbinden(registry: &ConnectionRegistry, wer: &str, room: &str, sink: Arc<TestSink>) -> Arc<Session> {
    let (session, _signal) = Session::neu(id(wer), raum(room), sink);
    registry.registrieren(Arc::clone(&session));
    session
}

fn engine(registry: &ConnectionRegistry, lookup: Arc<dyn MembershipLookup>) -> BroadcastEngine {
    BroadcastEngine::neu(registry.clone(), lookup, BroadcastKonfig::default())
}

// ---------------------------------------------------------------------------
// Szenarien
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn offline_mitglied_wird_uebersprungen() {
    let registry = ConnectionRegistry::neu();
    let lookup = Arc::new(StatischeMitglieder::neu());
    lookup.setzen(raum("R1"), vec![id("a"), id("b"), id("c")]);

    let (sink_a, sink_b) = (TestSink::ok(), TestSink::ok());
    verbinden(&registry, "a", "R1", sink_a.clone());
    verbinden(&registry, "b", "R1", sink_b.clone());

    let bericht = engine(&registry, lookup)
        .nachricht_senden(raum("R1"), id("a"), "hi")
        .await
        .unwrap();

    assert_eq!(bericht.push_versuche(), 2);
    assert_eq!(bericht.offline, 1);
    assert_eq!(sink_a.pushes(), 1);
    assert_eq!(sink_b.pushes(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn fehlerhafter_empfaenger_wird_isoliert() {
    let registry = ConnectionRegistry::neu();
    let lookup = Arc::new(StatischeMitglieder::neu());
    lookup.setzen(raum("R1"), vec![id("a"), id("b")]);

    let (sink_a, sink_b) = (TestSink::ok(), TestSink::kaputt());
    let a = verbinden(&registry, "a", "R1", sink_a.clone());
    let b = verbinden(&registry, "b", "R1", sink_b.clone());
    let engine = engine(&registry, lookup);

    let erster = engine.nachricht_senden(raum("R1"), id("a"), "hi").await.unwrap();
    assert_eq!(erster.zugestellt, 1);
    assert_eq!(erster.fehlgeschlagen, 1);
    assert_eq!(b.zustand(), SessionZustand::GeschlossenFehler);
    assert!(!b.ist_aktiv());
    assert!(a.ist_aktiv());

    let zweiter = engine.nachricht_senden(raum("R1"), id("a"), "hi2").await.unwrap();
    assert_eq!(zweiter.push_versuche(), 1);
    assert_eq!(sink_a.pushes(), 2);
    assert_eq!(sink_b.pushes(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn broadcast_wartet_auf_alle_pushes() {
    let registry = ConnectionRegistry::neu();
    let lookup = Arc::new(StatischeMitglieder::neu());
    lookup.setzen(raum("R1"), vec![id("a"), id("b"), id("c")]);

    let sinks: Vec<_> = ["a", "b", "c"]
        .iter()
        .map(|wer| {
            let sink = TestSink::langsam(Duration::from_millis(100));
            verbinden(&registry, wer, "R1", sink.clone());
            sink
        })
        .collect();

    let start = Instant::now();
    let bericht = engine(&registry, lookup)
        .punkt_teilen(raum("R1"), id("a"), 1.0, 2.0)
        .await
        .unwrap();
    let dauer = start.elapsed();

    // Alle Pushes sind bei Rueckkehr abgeschlossen
    assert_eq!(bericht.zugestellt, 3);
    assert!(sinks.iter().all(|s| s.pushes() == 1));
    // Parallel, nicht nacheinander
    assert!(dauer < Duration::from_millis(290), "Dauer: {dauer:?}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn raeume_sind_isoliert() {
    let registry = ConnectionRegistry::neu();
    let lookup = Arc::new(StatischeMitglieder::neu());
    lookup.setzen(raum("R1"), vec![id("a")]);
    lookup.setzen(raum("R2"), vec![id("b")]);

    let (sink_a, sink_b) = (TestSink::ok(), TestSink::ok());
    verbinden(&registry, "a", "R1", sink_a.clone());
    verbinden(&registry, "b", "R2", sink_b.clone());

    engine(&registry, lookup)
        .nachricht_senden(raum("R1"), id("a"), "nur R1")
        .await
        .unwrap();

    assert_eq!(sink_a.pushes(), 1);
    assert_eq!(sink_b.pushes(), 0);
}

#[tokio::test]
async fn raum_ohne_mitglieder_ist_erfolg() {
    let registry = ConnectionRegistry::neu();
    let bericht = engine(&registry, Arc::new(StatischeMitglieder::neu()))
        .nachricht_senden(raum("leer"), id("a"), "hallo?")
        .await
        .unwrap();
    assert_eq!(bericht.push_versuche(), 0);
}

#[tokio::test]
async fn mitglieder_abfrage_fehler_wird_gemeldet() {
    let registry = ConnectionRegistry::neu();
    let sink = TestSink::ok();
    verbinden(&registry, "a", "R1", sink.clone());

    let err = engine(&registry, Arc::new(KaputteDatenbank))
        .nachricht_senden(raum("R1"), id("a"), "x")
        .await
        .unwrap_err();

    assert!(matches!(err, DeliveryError::MitgliederNichtErmittelbar { .. }));
    assert_eq!(sink.pushes(), 0);
}

#[tokio::test]
async fn neueste_session_gewinnt() {
    let registry = ConnectionRegistry::neu();
    let lookup = Arc::new(StatischeMitglieder::neu());
    lookup.setzen(raum("R1"), vec![id("a")]);

    let (alt, neu) = (TestSink::ok(), TestSink::ok());
    verbinden(&registry, "a", "R1", alt.clone());
    verbinden(&registry, "a", "R1", neu.clone());

    engine(&registry, lookup)
        .nachricht_senden(raum("R1"), id("b"), "x")
        .await
        .unwrap();

    assert_eq!(alt.pushes(), 0);
    assert_eq!(neu.pushes(), 1);
}

#[tokio::test(start_paused = true)]
async fn haengender_empfaenger_blockiert_nicht_ewig() {
    let registry = ConnectionRegistry::neu();
    let lookup = Arc::new(StatischeMitglieder::neu());
    lookup.setzen(raum("R1"), vec![id("a"), id("b")]);

    let schnell = TestSink::ok();
    verbinden(&registry, "a", "R1", schnell.clone());
    let (haengend, signal) = Session::neu(id("b"), raum("R1"), TestSink::langsam(Duration::from_secs(3600)));
    registry.registrieren(Arc::clone(&haengend));

    let engine = BroadcastEngine::neu(
        registry.clone(),
        lookup,
        BroadcastKonfig {
            push_zeitlimit: Some(Duration::from_secs(1)),
        },
    );
    let bericht = engine.nachricht_senden(raum("R1"), id("a"), "x").await.unwrap();

    assert_eq!(bericht.zugestellt, 1);
    assert_eq!(bericht.fehlgeschlagen, 1);
    assert_eq!(
        signal.await,
        Beendigung::Fehler(SinkError::Zeitlimit(Duration::from_secs(1)))
    );
}

// ---------------------------------------------------------------------------
// Stream-Lebensdauer
// ---------------------------------------------------------------------------

async fn warten_auf_session(registry: &ConnectionRegistry, wer: &str) {
    while !registry.ist_registriert(&id(wer)) {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stream_endet_mit_fehler_des_pushes() {
    let registry = ConnectionRegistry::neu();
    let lookup = Arc::new(StatischeMitglieder::neu());
    lookup.setzen(raum("R1"), vec![id("a")]);
    let handler = StreamHandler::neu(registry.clone());

    let stream = tokio::spawn(async move {
        handler
            .oeffnen(id("a"), raum("R1"), TestSink::kaputt(), std::future::pending())
            .await
    });
    warten_auf_session(&registry, "a").await;

    engine(&registry, lookup)
        .nachricht_senden(raum("R1"), id("b"), "hi")
        .await
        .unwrap();

    let ergebnis = tokio::time::timeout(Duration::from_secs(5), stream)
        .await
        .expect("Stream muss enden")
        .unwrap();
    assert!(matches!(ergebnis, Err(DeliveryError::Zustellung { .. })));
    assert!(!registry.ist_registriert(&id("a")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stream_endet_normal_beim_schliessen() {
    let registry = ConnectionRegistry::neu();
    let handler = StreamHandler::neu(registry.clone());

    let stream = tokio::spawn(async move {
        handler
            .oeffnen(id("a"), raum("R1"), TestSink::ok(), std::future::pending())
            .await
    });
    warten_auf_session(&registry, "a").await;

    assert_eq!(registry.alle_schliessen(), 1);

    let ergebnis = tokio::time::timeout(Duration::from_secs(5), stream)
        .await
        .expect("Stream muss enden")
        .unwrap();
    assert!(ergebnis.is_ok());
}

#[tokio::test]
async fn stream_nach_schliessen_endet_sofort() {
    let registry = ConnectionRegistry::neu();
    let handler = StreamHandler::neu(registry.clone());
    registry.alle_schliessen();

    let ergebnis = tokio::time::timeout(
        Duration::from_secs(5),
        handler.oeffnen(id("a"), raum("R1"), TestSink::ok(), std::future::pending()),
    )
    .await
    .expect("spaeter Stream darf nicht haengen");
    assert!(ergebnis.is_ok());
    assert!(registry.ist_leer());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn paralleler_push_und_abbruch_signalisieren_einmal() {
    for _ in 0..50 {
        let registry = ConnectionRegistry::neu();
        let (session, signal) = Session::neu(id("a"), raum("R1"), TestSink::kaputt());
        registry.registrieren(Arc::clone(&session));

        let s1 = Arc::clone(&session);
        let push = tokio::spawn(async move {
            s1.zustellen(
                Arc::new(BroadcastPayload::nachricht(raum("R1"), id("b"), "x")),
                None,
            )
            .await
        });
        let s2 = Arc::clone(&session);
        let schliessen = tokio::spawn(async move { s2.schliessen() });

        push.await.unwrap();
        schliessen.await.unwrap();

        let beendigung = signal.await;
        match session.zustand() {
            SessionZustand::GeschlossenNormal => assert_eq!(beendigung, Beendigung::Normal),
            SessionZustand::GeschlossenFehler => {
                assert_eq!(beendigung, Beendigung::Fehler(SinkError::Geschlossen))
            }
            anders => panic!("Session muss beendet sein, ist {anders:?}"),
        }
    }
}
