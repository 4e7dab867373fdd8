mod buffer;
