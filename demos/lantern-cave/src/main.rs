use tokio::io::{AsyncBufReadExt, BufReader};
use wayfarer::prelude::*;

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// ```text
/// mouth --in--> hall --down--> pool (cave bat)
///                 \--left--> shrine
/// ```
fn cave(_room: &RoomId) -> LocationGraph {
    let mouth = Location::new("mouth", "Cave Mouth", "the cave mouth")
        .with_description("Daylight fades a few steps in. Something glints in the dust.")
        .with_item(
            Item::new("lantern", "Old Lantern", ItemKind::Misc)
                .with_description("Dented, but the wick is dry."),
        )
        .with_item(
            Item::new("stick", "Walking Stick", ItemKind::Weapon).with_stats(Stats {
                health: 0.0,
                health_max: 0.0,
                attack: 4.0,
                defense: 0.0,
            }),
        );

    let hall = Location::new("hall", "Echoing Hall", "an echoing hall")
        .with_description("Your footsteps come back to you twice.")
        .with_action(
            Action::new("light", "Light the lantern")
                .requires_item("lantern", "It is too dark to find anything.")
                .with_charges(1)
                .with_effect(Effect::Message {
                    text: "Warm light spills across the walls".into(),
                })
                .with_effect(Effect::DropItem {
                    item: Item::new("potion", "Murky Potion", ItemKind::Consumable { heal: 25.0 }),
                }),
        );

    let pool = Location::new("pool", "Still Pool", "a still pool")
        .with_description("Black water. Wings rustle overhead.")
        .with_npc(Npc::hostile("bat", "Cave Bat", 12.0, 4.0).with_description("All teeth."));

    let shrine = Location::new("shrine", "Shrine", "a forgotten shrine")
        .with_description("A stone face watches the dark.")
        .with_action(Action::new("pray", "Pray").with_effect(Effect::Heal { amount: 10.0 }));

    let mut graph = LocationGraph::new(mouth);
    let hall = graph.add(hall);
    let pool = graph.add(pool);
    let shrine = graph.add(shrine);
    graph.connect(graph.start(), "in", hall);
    graph.connect(hall, "down", pool);
    graph.connect(hall, "left", shrine);
    graph
}

// ---------------------------------------------------------------------------
// Console loop
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    wayfarer::init_tracing();

    let save_dir = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_SAVE_DIR.to_string());
    let engine = Engine::builder().save_dir(save_dir).build(cave)?;
    let player = engine.connect_to(RoomId::from("lantern-cave"), "wanderer", "Wanderer").await?;
    eprintln!("type commands like `look`, `go in`, `pickup lantern`; ctrl-d to quit");

    let bytes = engine.submit_raw(player, "look", "").await?;
    println!("{}", String::from_utf8_lossy(&bytes));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Ok(request) = Request::parse_line(&line) else {
            continue;
        };
        if request.verb == "quit" {
            break;
        }
        match engine.submit_raw(player, &request.verb, &request.param).await {
            Ok(bytes) => println!("{}", String::from_utf8_lossy(&bytes)),
            Err(err) => {
                tracing::warn!(%err, "command failed");
                break;
            }
        }
    }

    engine.disconnect(player).await?;
    engine.shutdown().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cave_is_valid() {
        let graph = cave(&RoomId::from("t"));
        assert!(graph.validate().is_ok());
        assert_eq!(graph.len(), 4);
    }

    #[tokio::test]
    async fn test_lantern_walkthrough() {
        let dir = std::env::temp_dir().join(format!("lantern-cave-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let engine = Engine::builder().save_dir(&dir).build(cave).unwrap();
        let me = engine.connect("tester", "Tester").await.unwrap();

        engine.submit(me, "go", "in").await.unwrap();
        let dark = engine.submit(me, "do", "light").await.unwrap();
        let dark = dark.as_view().unwrap();
        assert!(dark.history.iter().any(|e| e.text == "It is too dark to find anything."));

        engine.submit(me, "go", "back").await.unwrap();
        assert!(engine.submit(me, "pickup", "lantern").await.unwrap().as_view().is_some());
        engine.submit(me, "go", "in").await.unwrap();
        let lit = engine.submit(me, "do", "light").await.unwrap();
        let lit = lit.as_view().unwrap();
        assert!(lit.history.iter().any(|e| e.text == "Warm light spills across the walls"));
        assert!(lit.items.as_ref().is_some_and(|items| items.iter().any(|i| i.id == "potion")));

        let fight = engine.submit(me, "go", "down").await.unwrap();
        assert!(fight.as_view().and_then(|v| v.combat.as_ref()).is_some());
        for _ in 0..10 {
            let reply = engine.submit(me, "attack", "bat").await.unwrap();
            if reply.as_view().is_some_and(|v| v.combat.is_none()) {
                break;
            }
        }
        let after = engine.submit(me, "look", "").await.unwrap();
        assert!(after.as_view().is_some_and(|v| v.combat.is_none()));
    }
}
