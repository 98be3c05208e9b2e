use twodo_board::{
    Bin, BinId, Board, BoardError, BoardHost, Change, DragCoordinator, DragFeedback, DragOver,
    DragRequest, DropEvent, DropOutcome, DropPosition, DropQuery, DropSurface, DropTarget,
    Indicator, Item, ItemId, Page, PointerOrigin, RowKey,
};

#[derive(Default)]
struct Recorder {
    saves: usize,
    renders: usize,
    notices: Vec<String>,
    live_indicators: Vec<BinId>,
}

impl BoardHost for Recorder {
    fn save_data(&mut self) {
        self.saves += 1;
    }

    fn render(&mut self) {
        self.renders += 1;
    }

    fn notify(&mut self, message: &str) {
        self.notices.push(message.to_string());
    }

    fn show_indicator(&mut self, indicator: &Indicator) {
        assert!(
            self.live_indicators.is_empty(),
            "indicator drawn while another is visible"
        );
        self.live_indicators.push(indicator.bin.clone());
    }

    fn clear_indicator(&mut self, bin: &BinId) {
        self.live_indicators.retain(|live| live != bin);
    }
}

fn single_bin(items: Vec<Item>) -> Board {
    Board::new(vec![Page::new("p", "Page").bin(Bin::new("x", "X").with_items(items))])
}

fn sequence(board: &Board, bin: &str) -> Vec<String> {
    board
        .bin(&BinId::from(bin))
        .and_then(Bin::items)
        .unwrap_or_default()
        .iter()
        .map(|item| item.id.to_string())
        .collect()
}

fn drag(
    coordinator: &mut DragCoordinator,
    board: &Board,
    host: &mut Recorder,
    row: RowKey,
) -> String {
    coordinator
        .begin_drag(
            board,
            DragRequest::Item {
                bin: "x".into(),
                row,
                origin: PointerOrigin::Row,
            },
            host,
        )
        .expect("drag should start")
        .to_transfer()
        .unwrap()
}

#[test]
fn child_dropped_on_bin_body_lands_after_parent() {
    let mut board = single_bin(vec![
        Item::new("a", "todo").children(["b"]),
        Item::new("b", "todo").parent("a"),
        Item::new("c", "todo"),
    ]);
    let mut host = Recorder::default();
    let mut coordinator = DragCoordinator::default();

    let payload = drag(
        &mut coordinator,
        &board,
        &mut host,
        RowKey::Child {
            parent: 0,
            child: 0,
        },
    );
    let mut event = DropEvent::new(
        DropTarget::Bin {
            bin: "x".into(),
            position: None,
        },
        payload,
    );
    let outcome = coordinator.commit_drop(&mut board, &mut event, &mut host);
    assert!(outcome.is_committed());

    assert_eq!(sequence(&board, "x"), vec!["a", "b", "c"]);
    let items = board.bin(&"x".into()).and_then(Bin::items).unwrap();
    assert!(items[0].child_ids.is_empty());
    assert_eq!(items[1].parent_id, None);
    assert_eq!(host.saves, 1);
}

#[test]
fn unnest_second_child_of_third_item() {
    let mut board = single_bin(vec![
        Item::new("x0", "note"),
        Item::new("x1", "note"),
        Item::new("p", "note").children(["c0", "c1"]),
        Item::new("c1", "note").parent("p"),
        Item::new("c0", "note").parent("p"),
        Item::new("z", "note"),
    ]);
    let mut host = Recorder::default();
    let mut coordinator = DragCoordinator::default();

    let payload = drag(
        &mut coordinator,
        &board,
        &mut host,
        RowKey::Child {
            parent: 2,
            child: 1,
        },
    );
    let Some(twodo_board::DragSession::Item(session)) = coordinator.session().cloned() else {
        panic!("expected an item session");
    };
    assert_eq!(session.parent_index, Some(2));
    assert_eq!(session.child_index, Some(1));
    assert_eq!(session.source_index, 3);

    // Empty space below the last row resolves no target.
    let mut event = DropEvent::new(
        DropTarget::Bin {
            bin: "x".into(),
            position: Some(DropPosition::at_end(4)),
        },
        payload,
    );
    let outcome = coordinator.commit_drop(&mut board, &mut event, &mut host);
    let DropOutcome::Committed(Change::Unnested { parent, index, .. }) = outcome else {
        panic!("expected un-nest, got {outcome:?}");
    };
    assert_eq!(parent, ItemId::from("p"));
    assert_eq!(index, 3);
    assert_eq!(sequence(&board, "x"), vec!["x0", "x1", "p", "c1", "c0", "z"]);

    let items = board.bin(&"x".into()).and_then(Bin::items).unwrap();
    assert_eq!(items[2].child_ids, vec![ItemId::from("c0")]);
    assert_eq!(items[3].parent_id, None);
}

#[test]
fn dropping_in_place_is_a_noop() {
    let mut board = single_bin(vec![
        Item::new("a", "note").field("text", "first"),
        Item::new("b", "note").children(["c"]),
        Item::new("c", "note").parent("b"),
        Item::new("d", "note"),
    ]);
    let before = board.clone();
    let mut host = Recorder::default();
    let mut coordinator = DragCoordinator::default();

    for slot in [1, 2] {
        let payload = drag(&mut coordinator, &board, &mut host, RowKey::Root(1));
        let mut event = DropEvent::new(
            DropTarget::Bin {
                bin: "x".into(),
                position: Some(DropPosition {
                    insert_index: slot,
                    target: Some(RowKey::Root(slot)),
                }),
            },
            payload,
        );
        let outcome = coordinator.commit_drop(&mut board, &mut event, &mut host);
        assert!(matches!(outcome, DropOutcome::Unchanged));
    }

    assert_eq!(board, before);
    assert_eq!(host.saves, 0);
    assert_eq!(host.renders, 0);
}

#[test]
fn deleting_a_parent_removes_its_whole_family() {
    let mut board = single_bin(vec![
        Item::new("p", "note").children(["q", "r"]),
        Item::new("q", "note").parent("p").children(["s"]),
        Item::new("r", "note").parent("p"),
        Item::new("s", "note").parent("q"),
        Item::new("t", "note"),
    ]);
    let mut host = Recorder::default();
    let mut coordinator = DragCoordinator::default();

    let payload = drag(&mut coordinator, &board, &mut host, RowKey::Root(0));
    let mut event = DropEvent::new(DropTarget::Delete, payload);
    let outcome = coordinator.commit_drop(&mut board, &mut event, &mut host);

    let DropOutcome::Committed(Change::Deleted { ids, .. }) = outcome else {
        panic!("expected delete, got {outcome:?}");
    };
    let mut ids = ids.iter().map(ItemId::to_string).collect::<Vec<_>>();
    ids.sort();
    assert_eq!(ids, vec!["p", "q", "r", "s"]);
    assert_eq!(sequence(&board, "x"), vec!["t"]);
}

#[test]
fn cross_bin_move_carries_children() {
    let mut board = Board::new(vec![
        Page::new("p", "Page")
            .bin(Bin::new("x", "X").with_items(vec![
                Item::new("a", "note").children(["b"]),
                Item::new("b", "note").parent("a"),
                Item::new("c", "note"),
            ]))
            .bin(Bin::new("y", "Y").with_items(vec![Item::new("d", "note")])),
    ]);
    let mut host = Recorder::default();
    let mut coordinator = DragCoordinator::default();

    let payload = drag(&mut coordinator, &board, &mut host, RowKey::Root(0));
    let mut event = DropEvent::new(
        DropTarget::Bin {
            bin: "y".into(),
            position: Some(DropPosition {
                insert_index: 0,
                target: Some(RowKey::Root(0)),
            }),
        },
        payload,
    );
    assert!(coordinator.commit_drop(&mut board, &mut event, &mut host).is_committed());

    assert_eq!(sequence(&board, "x"), vec!["c"]);
    assert_eq!(sequence(&board, "y"), vec!["a", "b", "d"]);
    assert!(host.live_indicators.is_empty());
}

#[test]
fn dropping_on_a_loading_bin_changes_nothing() {
    let mut board = Board::new(vec![
        Page::new("p", "Page")
            .bin(Bin::new("x", "X").with_items(vec![Item::new("a", "note")]))
            .bin(Bin::lazy("y", "Y")),
    ]);
    let before = board.clone();
    let mut host = Recorder::default();
    let mut coordinator = DragCoordinator::default();

    let payload = drag(&mut coordinator, &board, &mut host, RowKey::Root(0));
    let mut event = DropEvent::new(
        DropTarget::Bin {
            bin: "y".into(),
            position: None,
        },
        payload,
    );
    let outcome = coordinator.commit_drop(&mut board, &mut event, &mut host);
    assert!(matches!(
        outcome,
        DropOutcome::Aborted(BoardError::NotResident(_))
    ));
    assert_eq!(board, before);
    assert!(host.notices.is_empty());
}

#[test]
fn unavailable_bin_rejects_hover_without_reloading() {
    let mut board = Board::new(vec![
        Page::new("p", "Page")
            .bin(Bin::new("x", "X").with_items(vec![Item::new("a", "note")]))
            .bin(Bin::lazy("y", "Y")),
    ]);
    assert!(board.begin_load(&"y".into()));
    let err = board
        .complete_load(&"y".into(), Err("disk unavailable".to_string()))
        .unwrap_err();
    assert!(err.is_user_visible());

    let mut host = Recorder::default();
    let mut coordinator = DragCoordinator::default();
    drag(&mut coordinator, &board, &mut host, RowKey::Root(0));
    let feedback = coordinator.update_drag(
        &mut board,
        DragOver {
            surface: DropSurface::Bin("y".into()),
            query: DropQuery::new(10.0, 0.0),
            frame: 1,
            rows: &[],
            root_len: 0,
            scroller: None,
        },
        &mut host,
    );
    assert_eq!(feedback, DragFeedback::Unavailable);
    assert!(host.live_indicators.is_empty());
}
