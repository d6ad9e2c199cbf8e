mod unreachable;
