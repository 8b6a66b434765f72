use criterion::{Criterion, criterion_group, criterion_main};
use ninarow_core::board::Board;
use ninarow_core::geometry::Geometry;
use ninarow_core::player::Player;
use std::hint::black_box;

fn bench_contains_win(c: &mut Criterion) {
    let g = Geometry::new(4, 9, 4).unwrap();
    let board = Board::from_cells(
        &g,
        "o..xo.x..
         .o.x.o...
         ..ox..x..
         ...o.x...",
    )
    .unwrap();

    c.bench_function("geometry_contains_win", |b| {
        b.iter(|| black_box(&g).contains_win(black_box(board.pieces(Player::Player1))))
    });
}

fn bench_line_scan(c: &mut Criterion) {
    let g = Geometry::new(4, 9, 4).unwrap();
    let lines = g.lines();
    let board = Board::from_cells(
        &g,
        "o..xo.x..
         .o.x.o...
         ..ox..x..
         ...o.x...",
    )
    .unwrap();

    c.bench_function("pattern_line_scan", |b| {
        b.iter(|| {
            lines
                .iter()
                .any(|line| line.contains_win(black_box(&board), Player::Player1))
        })
    });
}

fn bench_legal_moves(c: &mut Criterion) {
    let g = Geometry::new(8, 8, 5).unwrap();
    let mut board = Board::new(&g);
    for (i, position) in [27, 28, 36, 35, 19, 44].into_iter().enumerate() {
        let player = if i % 2 == 0 { Player::Player1 } else { Player::Player2 };
        board.apply_move(position, player).unwrap();
    }

    c.bench_function("board_legal_moves", |b| {
        b.iter(|| black_box(&board).legal_moves().count())
    });
}

criterion_group!(benches, bench_contains_win, bench_line_scan, bench_legal_moves);
criterion_main!(benches);
