//! Shipped maze definitions.

use crate::{
    MazeError,
    arrow::{ArrowMaze, RECORD_LEN},
    door::DoorMaze,
};

/// Encoded arrow mazes: `[id, start_row, start_col, reserved]` followed by
/// 100 tile words.
#[rustfmt::skip]
pub const ARROW_MAZES: [[u16; RECORD_LEN]; 3] = [
    // Maze 1: start row 2, column 6.
    [
        1, 2, 6, 0,
        0x0540, 0x0802, 0x0546, 0x0884, 0x0504, 0x0820, 0x0486, 0x08A0, 0x04A0, 0x0804,
        0x0961, 0x0408, 0x0808, 0x0448, 0x0821, 0x0404, 0x0A22, 0x054C, 0x0823, 0x0444,
        0x0422, 0x0824, 0x0610, 0x0A40, 0x0684, 0x0803, 0x0482, 0x0801, 0x0510, 0x0808,
        0x0840, 0x0601, 0x0804, 0x0425, 0x0814, 0x0410, 0x0A20, 0x0518, 0x088A, 0x0418,
        0x0403, 0x0808, 0x0509, 0x0A08, 0x0410, 0x0834, 0x0445, 0x0843, 0x0412, 0x0814,
        0x0921, 0x0484, 0x0844, 0x0400, 0x0844, 0x0408, 0x0861, 0x0484, 0x0A0E, 0x0658,
        0x0422, 0x08E0, 0x0464, 0x0803, 0x0403, 0x082A, 0x0580, 0x0880, 0x0410, 0x0818,
        0x0A50, 0x0421, 0x0820, 0x0481, 0x0804, 0x0414, 0x0804, 0x0440, 0x0880, 0x0410,
        0x0420, 0x0812, 0x0420, 0x0825, 0x0441, 0x0820, 0x0402, 0x0A21, 0x0414, 0x084C,
        0x0821, 0x0421, 0x0821, 0x0438, 0x0881, 0x0420, 0x0820, 0x04A0, 0x0891, 0x0418,
    ],
    // Maze 2: start row 2, column 3.
    [
        2, 2, 3, 0,
        0x0462, 0x0820, 0x0480, 0x0882, 0x06A4, 0x0980, 0x0444, 0x0880, 0x0424, 0x0884,
        0x0831, 0x04D0, 0x0A80, 0x0490, 0x0A02, 0x0408, 0x0890, 0x0440, 0x0814, 0x0440,
        0x0510, 0x0824, 0x0406, 0x0890, 0x0581, 0x0A51, 0x0619, 0x0890, 0x0590, 0x0808,
        0x0840, 0x0449, 0x0AA2, 0x0440, 0x0A07, 0x040E, 0x0A13, 0x0440, 0x0842, 0x068C,
        0x0401, 0x0829, 0x0510, 0x0909, 0x0440, 0x0A38, 0x040C, 0x0870, 0x040C, 0x0810,
        0x0902, 0x0405, 0x0808, 0x0420, 0x0814, 0x0480, 0x0808, 0x05C2, 0x0901, 0x0404,
        0x0442, 0x09C1, 0x0413, 0x0808, 0x0450, 0x0802, 0x040A, 0x0884, 0x0403, 0x0A54,
        0x0850, 0x0430, 0x0882, 0x042C, 0x0838, 0x0414, 0x082C, 0x0420, 0x0810, 0x0448,
        0x0602, 0x0A1C, 0x0441, 0x0811, 0x0422, 0x0801, 0x0422, 0x0800, 0x0480, 0x08C4,
        0x0810, 0x0401, 0x0830, 0x0430, 0x0810, 0x04A1, 0x0810, 0x0401, 0x0A80, 0x0498,
    ],
    // Maze 3: start row 5, column 2.
    [
        3, 5, 2, 0,
        0x0420, 0x0844, 0x0402, 0x0800, 0x0442, 0x0846, 0x0424, 0x0844, 0x0424, 0x0A40,
        0x0840, 0x0440, 0x0801, 0x0418, 0x084A, 0x0415, 0x0804, 0x0484, 0x0840, 0x0480,
        0x0420, 0x0940, 0x0630, 0x0888, 0x0410, 0x0808, 0x048C, 0x0910, 0x05A0, 0x0888,
        0x0802, 0x0414, 0x0AD0, 0x0408, 0x0805, 0x0528, 0x0822, 0x0401, 0x08A1, 0x0484,
        0x0462, 0x0818, 0x0408, 0x0804, 0x0401, 0x08A0, 0x0488, 0x08B0, 0x0505, 0x08D0,
        0x0810, 0x0421, 0x0832, 0x0480, 0x0804, 0x0420, 0x080A, 0x0403, 0x0806, 0x0480,
        0x0410, 0x0808, 0x040A, 0x0882, 0x0409, 0x080A, 0x0658, 0x0820, 0x0494, 0x0884,
        0x0812, 0x0640, 0x0841, 0x040B, 0x0802, 0x0481, 0x080C, 0x0488, 0x0824, 0x0450,
        0x0440, 0x0820, 0x0441, 0x0A88, 0x0408, 0x0802, 0x0454, 0x0840, 0x0410, 0x080C,
        0x0831, 0x0491, 0x09A1, 0x0680, 0x0908, 0x0488, 0x0808, 0x0501, 0x0831, 0x0410,
    ],];

/// The sliding-door maze, 13 columns by 18 rows.
pub const DOOR_MAZE_SOURCE: &str = "
TL,TB,TB,TB,TB,TB,TB,TB,TB,TR,TL,TB,TRBc<
LB,TR,TL,TB,TB,T,TB,TB,TR,RL,LB,TB,TR
TRL,RL,LB,TBg<,TRB,RL,TLe*,TRe,RL,LB,TB,TR,LR
RL,LB,TB,TB,TR,RL,LBe,Re,RL,LT,TR,LR,LR
L,T,TB,TRB,LR,LB,TR,RL,LB,BR,LR,LR,LR
RL,LR,TL,TR,L,TR,LR,Lrd-,TBrd,TBrd,Rrd+,LR,LR
RLB,LR,LR,LB,BR,LR,LR,LR,TL,TR,LR,LR,LR
TRL,LR,Lcd-,TBcd,TBcd,Rcd+,LR,LR,LR,BL,BR,LR,LR
RL,LR,LR,LT,TR,RL,LR,LR,LB,TR,TL,R,LR
L,B,BR,LR,LB,BR,LR,L,T,R,LRr<,LR,LR
RL,TLR,TL,,TBg>,TB,BR,LR,LR,LRg>,LR,LR,LR
RL,LRr>,LR,LB,TB,TB,TR,LR,LR,LR,LRc>,LR,LR
RL,LR,LR,LT,TB,TR,LR,LR,LR,BL,BR,LR,LR
RL,LB,BR,LR,LTR,LR,LBRm<,LR,Lgd-,TBgd,TBgd,Rgd+,LR
Lmd-,TBmd,TBmd,Rmd+,LR,LB,TB,RB,LR,TL,TR,LR,LR
LR,LT,TR,LR,LB,TB,TB,T,R,LRm>,LR,LR,LR
LR,LR,LR,LB,TB,TBm>,TB,R,LR,LR,LRg>,LR,LR
LB,RB,LB,TB,TB,TB,TBs,RB,LB,RB,LB,B,RB
";

/// Ids of every shipped arrow maze, in catalog order.
pub fn arrow_maze_ids() -> impl Iterator<Item = u16> {
    ARROW_MAZES.iter().map(|record| record[0])
}

/// Decodes the arrow maze with the given id.
pub fn arrow_maze(id: u16) -> Result<ArrowMaze, MazeError> {
    let record = ARROW_MAZES
        .iter()
        .find(|record| record[0] == id)
        .ok_or(MazeError::UnknownMaze(id))?;
    ArrowMaze::decode(record)
}

/// Decodes the shipped sliding-door maze.
pub fn door_maze() -> Result<DoorMaze, MazeError> {
    DoorMaze::parse(DOOR_MAZE_SOURCE)
}
